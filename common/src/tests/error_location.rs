use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that ErrorLocation Display uses the bracketed `[file:line:column]` format.
///
/// **WHY THIS MATTERS**: Every error in the client appends its location to the message.
/// If the format drifts, log lines stop pointing at the code that produced them.
///
/// **BUG THIS CATCHES**: Would catch if the Display impl drops the brackets or one of the
/// three coordinates.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A location captured in this file
    let location = ErrorLocation::from(Location::caller());

    // WHEN: Formatting as string
    let formatted = format!("{location}");

    // THEN: Should be "[file:line:column]"
    assert!(formatted.starts_with('['));
    assert!(formatted.ends_with(']'));
    assert_eq!(formatted.matches(':').count(), 2);
    assert!(formatted.contains(&location.line.to_string()));
}

/// **VALUE**: Verifies that `caller()` reports the caller of a `#[track_caller]` function.
///
/// **BUG THIS CATCHES**: Would catch `caller()` losing `#[track_caller]` and pointing at
/// `error_location.rs` in the library instead of the code that raised the error.
#[test]
fn given_track_caller_helper_when_capturing_then_points_at_call_site() {
    #[track_caller]
    fn raise() -> ErrorLocation {
        ErrorLocation::caller()
    }

    let expected_line = line!() + 1;
    let location = raise();

    assert!(location.file.ends_with("error_location.rs"));
    assert!(location.file.contains("tests"));
    assert_eq!(location.line, expected_line);
}
