/// Split a `"City, ST ZIP"` line into its parts.
///
/// Only the first comma separates the city; everything after it is the
/// state/ZIP part, split on its last space. Nothing is validated, so
/// `"Troy, Ohio"` yields a state of `"Ohio"` and no ZIP.
pub fn split_city_state_zip(address: Option<&str>) -> (Option<String>, Option<String>, Option<String>) {
    let address = match address {
        Some(a) if !a.trim().is_empty() => a,
        _ => return (None, None, None),
    };

    let (city, state_zip) = match address.split_once(',') {
        Some((city, rest)) => (city.trim(), rest.trim()),
        None => (address.trim(), ""),
    };

    let (state, zip) = match state_zip.rsplit_once(' ') {
        Some((state, zip)) => (state.trim(), Some(zip.to_string())),
        None => (state_zip, None),
    };

    let state = if state.is_empty() { None } else { Some(state.to_string()) };
    (Some(city.to_string()), state, zip)
}
