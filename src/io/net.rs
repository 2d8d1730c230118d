use crate::error::Result;
use reqwest::blocking::Client;
use std::{
    fs::File,
    io::{self, Write},
    path::Path,
    time::Duration,
};
use tracing::debug;

pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()?)
}

/// Stream `url` into `dest`, returning the number of bytes written.
pub fn download_to(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    let mut resp = client.get(url).send()?.error_for_status()?;
    debug!(url, total = resp.content_length(), "downloading audio");

    let mut file = File::create(dest)?;
    let downloaded = io::copy(&mut resp, &mut file)?;
    file.flush()?;

    debug!(bytes = downloaded, path = %dest.display(), "download complete");
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn download_replaces_existing_file() {
        let server = MockServer::start();
        let body = vec![7u8; 3 * 1024 * 1024 + 5];
        server.mock(|when, then| {
            when.method(GET).path("/a.wav");
            then.status(200).body(body.clone());
        });

        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("audio_file.wav");
        fs::write(&dest, b"stale contents that are longer than nothing").unwrap();

        let client = http_client(Duration::from_secs(10)).unwrap();
        let n = download_to(&client, &server.url("/a.wav"), &dest).unwrap();

        assert_eq!(n, body.len() as u64);
        assert_eq!(fs::read(&dest).unwrap(), body);
    }

    #[test]
    fn error_status_is_returned_before_writing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone.wav");
            then.status(500);
        });

        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("audio_file.wav");
        let client = http_client(Duration::from_secs(10)).unwrap();

        assert!(download_to(&client, &server.url("/gone.wav"), &dest).is_err());
        assert!(!dest.exists());
    }
}
