//! Blocking libcurl GET helpers. Call from `spawn_blocking` in async code.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str;
use std::time::Duration;

use crate::retry::FetchError;

pub(crate) const USER_AGENT: &str = concat!("relsync/", env!("CARGO_PKG_VERSION"));

/// Response headers collected during a transfer, one line per entry.
pub(crate) type HeaderLines = Vec<String>;

fn easy_get(url: &str, headers: &[String], overall: Duration) -> Result<curl::easy::Easy, FetchError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(USER_AGENT)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(overall)?;

    if !headers.is_empty() {
        let mut list = curl::easy::List::new();
        for h in headers {
            list.append(h)?;
        }
        easy.http_headers(list)?;
    }
    Ok(easy)
}

fn check_status(easy: &mut curl::easy::Easy, url: &str) -> Result<(), FetchError> {
    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        return Err(FetchError::Http {
            url: url.to_string(),
            status,
        });
    }
    Ok(())
}

/// GET `url` into memory. Returns the body and the response header lines.
pub(crate) fn get_bytes(url: &str, headers: &[String]) -> Result<(Vec<u8>, HeaderLines), FetchError> {
    let mut easy = easy_get(url, headers, Duration::from_secs(120))?;
    let mut body = Vec::new();
    let mut header_lines = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                header_lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    check_status(&mut easy, url)?;
    Ok((body, header_lines))
}

/// GET `url` straight to a file at `dest` (created or truncated). Returns bytes written.
/// On any error the partial file is left for the caller to discard.
pub(crate) fn get_to_file(url: &str, dest: &Path) -> Result<u64, FetchError> {
    let mut file = File::create(dest)?;
    let mut easy = easy_get(url, &[], Duration::from_secs(3600))?;
    let mut written: u64 = 0;
    let mut write_error: Option<std::io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_error {
        return Err(FetchError::Storage(e));
    }
    performed?;
    check_status(&mut easy, url)?;
    file.sync_all()?;
    Ok(written)
}

/// Value of the first header named `name` (case-insensitive).
pub(crate) fn header_value<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}
