//! End-to-end lifecycle of a light curve: create, delay, sample, reconstruct,
//! persist to a record and restore.

use tdsim_core::{
    Cadence, CurveOptions, LightCurve, LightCurveError, LightCurveRecord, ObservedSet,
    ReconstructOptions, SampleRequest, SamplingPlan,
};

fn quasar(seed: i64) -> LightCurve {
    LightCurve::new(
        seed,
        222,
        CurveOptions {
            tau: Some(100.0),
            sigma: Some(0.02),
            ..CurveOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn two_images_share_an_intrinsic_curve_up_to_the_delay() {
    let a = quasar(42);
    let mut b = a.clone();
    b.add_delay(30.0).unwrap();

    // Image B at t + 30 shows what image A showed at t.
    assert_eq!(&b.lc()[30..], &a.lc()[..a.lc().len() - 30]);
    assert_eq!(b.tdelay(), 30.0);
    assert_eq!(a.tdelay(), 0.0);
}

#[test]
fn full_pipeline_produces_consistent_observation() {
    let mut c = quasar(7);
    c.add_delay(12.0).unwrap();
    c.sample(
        &SampleRequest::new(SamplingPlan::cadence(Cadence::Weekly).with_season())
            .with_amplitude(0.01)
            .with_noise_seed(54),
    )
    .unwrap();

    // Ten seasons of 120 days at a weekly cadence.
    let n = c.time_samp().len();
    assert!((160..=180).contains(&n), "{n} samples");
    assert_eq!(c.noise().len(), n);
    assert_eq!(c.amp_n(), 0.01);

    c.reconstruct(&ReconstructOptions {
        smoothing: 1e-4,
        ..ReconstructOptions::default()
    })
    .unwrap();
    assert_eq!(c.lc_sp().len(), c.time().len());
    assert!(c.lc_sp().iter().all(|v| v.is_finite()));
}

#[test]
fn resampling_with_same_seed_reproduces_noise() {
    let mut a = quasar(3);
    let mut b = quasar(3);
    let req = SampleRequest::new(SamplingPlan::cadence(Cadence::Daily)).with_noise_seed(9);
    a.sample(&req).unwrap();
    b.sample(&req).unwrap();
    assert_eq!(a.noise(), b.noise());

    b.sample(&req.clone().with_noise_seed(10)).unwrap();
    assert_ne!(a.noise(), b.noise());
}

#[test]
fn record_survives_json_round_trip() {
    let mut c = quasar(11);
    c.add_delay(-4.0).unwrap();
    c.sample(&SampleRequest::new(SamplingPlan::indices(vec![0, 10, 20, 30, 40])))
        .unwrap();

    let json = serde_json::to_string(&c).unwrap();
    let back: LightCurve = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
    assert_eq!(back.usrind().iter().sum::<i32>(), 5);
}

#[test]
fn corrupt_record_is_refused_on_deserialize() {
    let mut record: LightCurveRecord = quasar(1).to_record();
    record.lc.truncate(10);
    let json = serde_json::to_string(&record).unwrap();
    assert!(serde_json::from_str::<LightCurve>(&json).is_err());
    assert!(matches!(
        LightCurve::try_from(record),
        Err(LightCurveError::ShapeMismatch { .. })
    ));
}

#[test]
fn observed_set_collects_images() {
    let mut images: Vec<LightCurve> = Vec::new();
    let base = quasar(5);
    for (i, delay) in [0.0, 15.0].iter().enumerate() {
        let mut img = base.clone();
        img.add_delay(*delay).unwrap();
        img.sample(&SampleRequest::new(SamplingPlan::cadence(Cadence::Weekly)).with_noise_seed(i as i64))
            .unwrap();
        images.push(img);
    }

    let time = images[0].time_samp().to_vec();
    let curves = images.iter().map(|c| c.observed()).collect();
    let set = ObservedSet::new(time, curves, None).unwrap();
    let flux = set.to_flux();
    assert_eq!(flux.len(), 2);
    assert_eq!(flux[1].label, "B");
    assert!(flux[0].flux.iter().all(|&f| f > 0.0));
}
