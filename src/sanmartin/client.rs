// src/sanmartin/client.rs
use std::time::Duration;

use reqwest::header;

use crate::utils::error::FetchError;

/// Published timetable for the Retiro - Dr. Cabred service.
pub const DEFAULT_TIMETABLE_URL: &str =
    "https://www.trensanmartin.com.ar/pdf/horarios-trenes-retiro-jose-c-paz-pilar-cabred.pdf";

const USER_AGENT: &str = "sanmartin_extractor/0.1 (timetable scraper)";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Creates a reqwest client configured for fetching the timetable PDF.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Downloads the timetable PDF and returns its raw bytes.
pub async fn download_timetable_pdf(url: &str) -> Result<Vec<u8>, FetchError> {
    let client = build_client()?; // Propagate client build error if any

    tracing::info!("Downloading timetable PDF from: {}", url);

    let response = client
        .get(url)
        .header(header::ACCEPT, "application/pdf,*/*")
        .send()
        .await?; // Propagates reqwest::Error as FetchError::Network

    // Check if the request was successful (status code 2xx)
    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!("Received 404 Not Found - the PDF may have moved to a new URL.");
            return Err(FetchError::NotFound(url.to_string()));
        }
        // Return generic HTTP error
        return Err(FetchError::Http(status));
    }

    let body = response.bytes().await?;
    tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

    Ok(body.to_vec())
}
