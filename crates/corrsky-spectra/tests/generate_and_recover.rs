//! Generated coefficients reproduce their target spectra.

use corrsky_core::{EntryIndex, FieldIndex, FieldName, LRange, RedshiftName, WorkerConfig};
use corrsky_spectra::{
    estimate_all, recover_alms, CoefficientGenerator, RingWeights, SpectrumSet,
};
use corrsky_test_utils::fixtures::power_law_set;
use corrsky_test_utils::{pack_alm, rel_diff, PackedTransform};

fn three_entry_set(lmax: usize) -> SpectrumSet {
    power_law_set(3, lmax, 0.4)
}

#[test]
fn recovered_spectra_scatter_within_cosmic_variance() {
    let lmax = 200;
    let set = three_entry_set(lmax);
    let lrange = LRange::new(2, lmax as u32);
    let generator = CoefficientGenerator::new(&set, lrange).unwrap();
    let pool = WorkerConfig::fixed(4).build_pool().unwrap();
    let alms: Vec<_> = generator.generate(31, &pool).into_iter().map(Some).collect();

    let out = LRange::new(20, lmax as u32);
    let rec = estimate_all(&alms, out, None, &pool).unwrap();

    for ((i, j), cl) in rec.iter() {
        let cl = cl.unwrap();
        let (ei, ej) = (EntryIndex(i as u32), EntryIndex(j as u32));
        for (offset, l) in out.iter().enumerate() {
            let target = |a, b| set.get(a, b).map_or(0.0, |s| s[l as usize]);
            let cij = target(ei, ej);
            let sd = ((cij * cij + target(ei, ei) * target(ej, ej)) / (2 * l + 1) as f64).sqrt();
            let dev = (cl[offset] - cij).abs();
            assert!(dev < 6.0 * sd, "pair ({i},{j}) l={l}: {} vs {cij}", cl[offset]);
        }
    }
}

#[test]
fn uncorrelated_pair_averages_to_zero() {
    let lmax = 200;
    let set = three_entry_set(lmax);
    let generator = CoefficientGenerator::new(&set, LRange::new(2, lmax as u32)).unwrap();
    let pool = WorkerConfig::fixed(2).build_pool().unwrap();
    let alms: Vec<_> = generator.generate(5, &pool).into_iter().map(Some).collect();
    let rec = estimate_all(&alms, LRange::new(2, lmax as u32), None, &pool).unwrap();

    // Only neighbouring entries are correlated: zero cross-covariance.
    let cl = rec.get(0, 2).unwrap();
    let mean = cl.iter().sum::<f64>() / cl.len() as f64;
    assert!(mean.abs() < 0.05, "{mean}");
}

#[test]
fn worker_count_fixes_the_realization() {
    let set = three_entry_set(64);
    let generator = CoefficientGenerator::new(&set, LRange::new(2, 64)).unwrap();
    let pool_a = WorkerConfig::fixed(3).build_pool().unwrap();
    let pool_b = WorkerConfig::fixed(3).build_pool().unwrap();
    assert_eq!(generator.generate(8, &pool_a), generator.generate(8, &pool_b));
}

#[test]
fn labels_cover_every_pair() {
    let index = FieldIndex::build(
        &[FieldName(1), FieldName(1), FieldName(2)],
        &[RedshiftName(1), RedshiftName(2), RedshiftName(1)],
    )
    .unwrap();
    let set = three_entry_set(16);
    let generator = CoefficientGenerator::new(&set, LRange::new(2, 16)).unwrap();
    let pool = WorkerConfig::fixed(1).build_pool().unwrap();
    let alms: Vec<_> = generator.generate(1, &pool).into_iter().map(Some).collect();
    let rec = estimate_all(&alms, LRange::new(2, 16), None, &pool).unwrap();
    let labels = rec.labels(&index).unwrap();
    assert_eq!(labels.len(), 6);
    assert_eq!(labels[0], "Cl-f1z1f1z1");
    assert_eq!(labels[1], "Cl-f1z1f1z2");
    assert_eq!(labels[5], "Cl-f2z1f2z1");
}

#[test]
fn spectra_survive_map_analysis() {
    let lmax = 48;
    let set = three_entry_set(lmax);
    let generator = CoefficientGenerator::new(&set, LRange::new(2, lmax as u32)).unwrap();
    let pool = WorkerConfig::fixed(2).build_pool().unwrap();
    let alms = generator.generate(77, &pool);

    let mut maps: Vec<Option<Vec<f64>>> = alms.iter().map(|a| Some(pack_alm(a))).collect();
    maps[1] = None;
    let weights = RingWeights::from_offsets(&[1.0]);
    let recovered = recover_alms(&maps, lmax as u32, &PackedTransform, &weights).unwrap();
    assert!(recovered[1].is_none());

    let out = LRange::new(2, lmax as u32);
    let direct: Vec<_> = alms.into_iter().map(Some).collect();
    let from_maps = estimate_all(&recovered, out, None, &pool).unwrap();
    let reference = estimate_all(&direct, out, None, &pool).unwrap();
    assert!(from_maps.get(0, 1).is_none());

    // Ring weight 2 scales every coefficient, so every spectrum by 4.
    for (a, b) in from_maps.get(0, 2).unwrap().iter().zip(reference.get(0, 2).unwrap()) {
        assert!(rel_diff(*a, 4.0 * b) < 1e-12, "{a} vs {b}");
    }
    for (a, b) in from_maps.get(2, 2).unwrap().iter().zip(reference.get(2, 2).unwrap()) {
        assert!(rel_diff(*a, 4.0 * b) < 1e-12);
    }
}
