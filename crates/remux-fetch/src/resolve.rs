//! Filename → URL resolution against a trusted base.
//!
//! Callers name a resource, they never choose where it is fetched from: any
//! scheme, host, port or userinfo embedded in the input is discarded and
//! only the path, query and fragment survive.

use url::Url;

/// Resolve `reference` against `base`.
///
/// The returned URL always carries the scheme, host and port of `base`.
/// Empty or unparsable input degrades to `base` itself.
pub fn resolve(base: &Url, reference: &str) -> Url {
    match Url::parse(reference) {
        // Copy the parsed parts over instead of re-joining them as text: a
        // path such as `//x/y` would otherwise be read as an authority.
        Ok(absolute) => {
            let mut pinned = base.clone();
            pinned.set_path(absolute.path());
            pinned.set_query(absolute.query());
            pinned.set_fragment(absolute.fragment());
            pinned
        }
        // No scheme: already a relative reference (it may still carry a
        // `//host` authority, which `pin_origin` strips after the join).
        Err(_) => {
            let joined = base.join(reference).unwrap_or_else(|_| base.clone());
            pin_origin(base, joined)
        }
    }
}

/// Re-home `candidate` onto `base` if the join escaped the trusted origin.
fn pin_origin(base: &Url, candidate: Url) -> Url {
    let same_origin = candidate.scheme() == base.scheme()
        && candidate.host_str() == base.host_str()
        && candidate.port_or_known_default() == base.port_or_known_default()
        && candidate.username() == base.username()
        && candidate.password() == base.password();
    if same_origin {
        return candidate;
    }

    let mut pinned = base.clone();
    pinned.set_path(candidate.path());
    pinned.set_query(candidate.query());
    pinned.set_fragment(candidate.fragment());
    pinned
}
