use super::*;

#[test]
fn zero_play_limit_is_invalid() {
    assert!(matches!(
        PlayLimit::finite(0),
        Err(PlaybackError::InvalidConfiguration(_))
    ));
}

#[test]
fn limit_reached_uses_ge() {
    let l = PlayLimit::finite(2).unwrap();
    assert!(!l.is_reached(1));
    assert!(l.is_reached(2));
    assert!(l.is_reached(3));
    assert!(!PlayLimit::Infinite.is_reached(u32::MAX));
}

#[test]
fn play_limit_json_shape() {
    let inf: PlayLimit = serde_json::from_str("\"infinite\"").unwrap();
    assert_eq!(inf, PlayLimit::Infinite);
    let three: PlayLimit = serde_json::from_str("{\"finite\":3}").unwrap();
    assert_eq!(three, PlayLimit::finite(3).unwrap());
    assert!(serde_json::from_str::<PlayLimit>("{\"finite\":0}").is_err());
}
