use crate::HttpStatusCode;

/// **VALUE**: Verifies that status codes display as the bare number.
///
/// **WHY THIS MATTERS**: Login failures are reported as `status {code}`. An extra prefix or
/// wrapper in Display would change that message for every caller matching on it.
///
/// **BUG THIS CATCHES**: Would catch if Display switched to the Debug form
/// (`HttpStatusCode(401)`).
#[test]
fn given_status_code_when_displayed_then_shows_bare_number() {
    // GIVEN: A 401 status
    let status = HttpStatusCode::from(401_u16);

    // WHEN: Formatting
    let formatted = status.to_string();

    // THEN: Only the number is shown
    assert_eq!(formatted, "401");
}

/// **VALUE**: Verifies the server error range used to flag failing login endpoints.
///
/// **BUG THIS CATCHES**: Would catch off-by-one errors at the 5xx boundaries.
#[test]
fn given_boundary_codes_when_categorized_then_server_range_is_exclusive() {
    assert!(!HttpStatusCode(499).is_server_error());
    assert!(HttpStatusCode(500).is_server_error());
    assert!(HttpStatusCode(599).is_server_error());
    assert!(!HttpStatusCode(600).is_server_error());
    assert!(!HttpStatusCode::OK.is_server_error());
}

/// **VALUE**: Verifies that only 200 counts as a successful login status.
///
/// **BUG THIS CATCHES**: Would catch `is_ok` widening to the whole 2xx range.
#[test]
fn given_2xx_codes_when_checked_then_only_200_is_ok() {
    assert!(HttpStatusCode(200).is_ok());
    assert!(!HttpStatusCode(201).is_ok());
    assert!(!HttpStatusCode(204).is_ok());
}
