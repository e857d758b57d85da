#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

#[test_case("by_name", EnumStrategy::ByName)]
#[test_case("ByName", EnumStrategy::ByName)]
#[test_case("name", EnumStrategy::ByName)]
#[test_case("by_value", EnumStrategy::ByValue)]
#[test_case("ByValue", EnumStrategy::ByValue)]
#[test_case("value", EnumStrategy::ByValue)]
fn EnumStrategy___from_str___parses_spelling(input: &str, expected: EnumStrategy) {
    assert_eq!(input.parse::<EnumStrategy>().unwrap(), expected);
}

#[test_case("throw", NullHandling::Throw)]
#[test_case("Throw", NullHandling::Throw)]
#[test_case("ignore_member", NullHandling::IgnoreMember)]
#[test_case("ignore", NullHandling::IgnoreMember)]
#[test_case("map_to_default", NullHandling::MapToDefault)]
#[test_case("default", NullHandling::MapToDefault)]
fn NullHandling___from_str___parses_spelling(input: &str, expected: NullHandling) {
    assert_eq!(input.parse::<NullHandling>().unwrap(), expected);
}

#[test_case("by_index")]
#[test_case("")]
#[test_case("BYNAME")]
fn EnumStrategy___from_str___rejects_unknown(input: &str) {
    let err = input.parse::<EnumStrategy>().unwrap_err();

    assert!(matches!(err, MapweaveError::Config(_)));
}

#[test_case("panic")]
#[test_case("null")]
fn NullHandling___from_str___rejects_unknown(input: &str) {
    let err = input.parse::<NullHandling>().unwrap_err();

    assert!(matches!(err, MapweaveError::Config(_)));
}

#[test_case(EnumStrategy::ByName)]
#[test_case(EnumStrategy::ByValue)]
fn EnumStrategy___display___round_trips_through_from_str(strategy: EnumStrategy) {
    assert_eq!(strategy.to_string().parse::<EnumStrategy>().unwrap(), strategy);
}

#[test_case(NullHandling::Throw)]
#[test_case(NullHandling::IgnoreMember)]
#[test_case(NullHandling::MapToDefault)]
fn NullHandling___display___round_trips_through_from_str(handling: NullHandling) {
    assert_eq!(handling.to_string().parse::<NullHandling>().unwrap(), handling);
}
