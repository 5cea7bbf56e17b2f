//! US state name mapping for joining shipments to boundaries
//! Maps two-letter postal codes to the full names used by the boundary dataset

use std::collections::HashMap;
use std::sync::LazyLock;

/// State code to full name. The 50 states only, no DC or territories.
pub static STATE_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Northeast
    m.insert("CT", "Connecticut");
    m.insert("ME", "Maine");
    m.insert("MA", "Massachusetts");
    m.insert("NH", "New Hampshire");
    m.insert("RI", "Rhode Island");
    m.insert("VT", "Vermont");
    m.insert("NJ", "New Jersey");
    m.insert("NY", "New York");
    m.insert("PA", "Pennsylvania");

    // Midwest
    m.insert("IL", "Illinois");
    m.insert("IN", "Indiana");
    m.insert("MI", "Michigan");
    m.insert("OH", "Ohio");
    m.insert("WI", "Wisconsin");
    m.insert("IA", "Iowa");
    m.insert("KS", "Kansas");
    m.insert("MN", "Minnesota");
    m.insert("MO", "Missouri");
    m.insert("NE", "Nebraska");
    m.insert("ND", "North Dakota");
    m.insert("SD", "South Dakota");

    // South
    m.insert("DE", "Delaware");
    m.insert("FL", "Florida");
    m.insert("GA", "Georgia");
    m.insert("MD", "Maryland");
    m.insert("NC", "North Carolina");
    m.insert("SC", "South Carolina");
    m.insert("VA", "Virginia");
    m.insert("WV", "West Virginia");
    m.insert("AL", "Alabama");
    m.insert("KY", "Kentucky");
    m.insert("MS", "Mississippi");
    m.insert("TN", "Tennessee");
    m.insert("AR", "Arkansas");
    m.insert("LA", "Louisiana");
    m.insert("OK", "Oklahoma");
    m.insert("TX", "Texas");

    // West
    m.insert("AZ", "Arizona");
    m.insert("CO", "Colorado");
    m.insert("ID", "Idaho");
    m.insert("MT", "Montana");
    m.insert("NV", "Nevada");
    m.insert("NM", "New Mexico");
    m.insert("UT", "Utah");
    m.insert("WY", "Wyoming");
    m.insert("AK", "Alaska");
    m.insert("CA", "California");
    m.insert("HI", "Hawaii");
    m.insert("OR", "Oregon");
    m.insert("WA", "Washington");

    m
});

/// Full state name for a two-letter code. Matching is exact.
pub fn state_name(code: &str) -> Option<&'static str> {
    STATE_NAMES.get(code).copied()
}

/// All known codes, sorted
pub fn state_codes() -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = STATE_NAMES.keys().copied().collect();
    codes.sort_unstable();
    codes
}
