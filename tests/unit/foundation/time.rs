use super::*;

#[test]
fn frame_duration_rejects_zero_parts() {
    assert!(FrameDuration::new(0, 10).is_err());
    assert!(FrameDuration::new(1, 0).is_err());
}

#[test]
fn frame_duration_is_reduced() {
    let a = FrameDuration::new(50, 1000).unwrap();
    let b = FrameDuration::new(1, 20).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.num(), 1);
    assert_eq!(a.den(), 20);
}

#[test]
fn apng_delay_rules() {
    let fallback = FrameDuration::from_millis(100).unwrap();
    assert_eq!(
        FrameDuration::from_apng_delay(5, 0, fallback),
        FrameDuration::new(1, 20).unwrap()
    );
    assert_eq!(FrameDuration::from_apng_delay(0, 30, fallback), fallback);
    assert_eq!(
        FrameDuration::from_apng_delay(1, 30, fallback),
        FrameDuration::new(1, 30).unwrap()
    );
}

#[test]
fn to_std_rounds_to_nearest_nanosecond() {
    let third = FrameDuration::new(1, 3).unwrap();
    assert_eq!(third.to_std(), Duration::from_nanos(333_333_333));
    let two_thirds = FrameDuration::new(2, 3).unwrap();
    assert_eq!(two_thirds.to_std(), Duration::from_nanos(666_666_667));
}

#[test]
fn timebase_converts_thirds_exactly() {
    let third = FrameDuration::new(1, 3).unwrap();
    let tb = Timebase::for_durations([third]);
    assert!(tb.is_exact());
    assert_eq!(tb.units_per_sec() % 3, 0);
    assert_eq!(tb.units_of(third) * 3, u128::from(tb.units_per_sec()));
}

#[test]
fn timebase_accumulation_does_not_drift() {
    let d = FrameDuration::new(1, 30).unwrap();
    let tb = Timebase::for_durations([d]);
    let frame = tb.units_of(d);
    let total: u128 = (0..30_000).map(|_| frame).sum();
    assert_eq!(total, u128::from(tb.units_per_sec()) * 1000);
}

#[test]
fn timebase_std_durations_are_exact() {
    let tb = Timebase::for_durations([FrameDuration::new(1, 7).unwrap()]);
    let units = tb.units_of_std(Duration::from_millis(40));
    assert_eq!(tb.to_std(units), Duration::from_millis(40));
}

#[test]
fn timebase_falls_back_when_lcm_overflows() {
    let primes = [65_521u32, 65_519, 65_497, 65_479, 65_449];
    let durs = primes.iter().map(|&p| FrameDuration::new(1, p).unwrap());
    let tb = Timebase::for_durations(durs);
    assert!(!tb.is_exact());
    assert_eq!(tb.units_per_sec(), NANOS_PER_SEC);
    assert!(tb.units_of(FrameDuration::new(1, 65_521).unwrap()) >= 1);
}
