//! Parse HTTP response header lines into a `Response`.

use super::Response;

/// Status code from an `HTTP/x.y NNN reason` line.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Parse collected header lines. When redirects were followed the lines hold
/// several responses; only the last one counts.
pub(crate) fn parse_headers(lines: &[String]) -> Response {
    let mut response = Response::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(status) = parse_status_line(line) {
            response = Response {
                status,
                ..Response::default()
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    response.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("last-modified") && !value.is_empty() {
                response.last_modified = Some(value.to_string());
            }
        }
    }

    response
}
