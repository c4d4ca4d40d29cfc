//! Concrete end-to-end scenarios against the public `ConciseSet` surface.

use concise::ConciseSet;

#[test]
fn s1_thirty_one_consecutive_elements() {
    let mut s = ConciseSet::new();
    for e in 0..31 {
        s.add(e).unwrap();
    }
    assert_eq!(s.size(), 31);
    assert_eq!(s.last().unwrap(), 30);
    assert!((s.bitmap_compression_ratio() - 1.0).abs() < 1e-9);
}

#[test]
fn s2_sparse_pair() {
    let s = ConciseSet::from_elements([5, 36]).unwrap();
    assert_eq!(s.size(), 2);
    assert_eq!(s.last().unwrap(), 36);
    assert!(s.contains(5) && s.contains(36));
}

#[test]
fn s3_algebra_over_two_sets() {
    let a = ConciseSet::from_elements([3, 5]).unwrap();
    let b = ConciseSet::from_elements([2, 4, 3, 10, 11, 20, 40]).unwrap();

    assert_eq!(collect(&a.intersection(&b)), vec![3]);
    assert_eq!(collect(&a.union(&b)), vec![2, 3, 4, 5, 10, 11, 20, 40]);
    assert_eq!(collect(&b.difference(&a)), vec![2, 4, 10, 11, 20, 40]);
    assert_eq!(collect(&a.symmetric_difference(&b)), vec![2, 4, 5, 10, 11, 20, 40]);
    assert_eq!(a.intersection_size(&b), 1);
}

#[test]
fn s4_complement_of_a_billion() {
    let a = ConciseSet::singleton(1_000_000_000).unwrap();
    assert_eq!(a.size(), 1);
    let c = a.complemented();
    assert_eq!(c.size(), 1_000_000_000);
    assert_eq!(c.first().unwrap(), 0);
    assert_eq!(c.last().unwrap(), 999_999_999);
}

#[test]
fn s5_fill_then_clear_range() {
    let mut a = ConciseSet::new();
    a.fill(0, 99).unwrap();
    a.clear_range(20, 30).unwrap();
    assert_eq!(a.size(), 100 - 11);
    assert!(a.contains(19));
    assert!(!a.contains(25));
    assert!(a.contains(31));
}

#[test]
fn s6_range_check_errors() {
    let mut a = ConciseSet::new();
    assert!(a.add(1_040_187_423).is_err());
    assert!(a.add(-1).is_err());
}

fn collect(s: &ConciseSet) -> Vec<i64> {
    s.iter().map(|r| r.unwrap()).collect()
}
