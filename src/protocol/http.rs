// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the Arlo cloud.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::command::Command;
use crate::error::{ParseError, ProtocolError, Result};
use crate::protocol::{PushStream, Transport, sse};
use crate::types::{Device, Recording, RecordingKey};

/// Header carrying a device's routing id on device-scoped calls.
const XCLOUD_ID: &str = "xcloudId";

// ============================================================================
// HttpConfig
// ============================================================================

/// Connection settings for [`HttpClient`].
///
/// # Examples
///
/// ```
/// use arlo_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new()
///     .with_base_url("http://127.0.0.1:8080/hmsweb")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://127.0.0.1:8080/hmsweb");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl HttpConfig {
    /// Default API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://arlo.netgear.com/hmsweb";
    /// Default timeout for API calls. The push channel has none.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default `User-Agent` header.
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Sets the API root. A trailing slash is ignored.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the timeout for API calls.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the API root.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout for API calls.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the `User-Agent` header.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Session
// ============================================================================

/// The session returned by a successful login.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    user_id: String,
    email: String,
    token: String,
    #[serde(default)]
    account_status: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

impl Session {
    /// Returns the user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the account email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the session token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the account status (e.g. `registered`), if reported.
    #[must_use]
    pub fn account_status(&self) -> Option<&str> {
        self.account_status.as_deref()
    }

    /// Returns the account's country code, if reported.
    #[must_use]
    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// Authenticated client for the Arlo REST API and push channel.
///
/// Every API response is wrapped in an envelope `{"success": bool, "data":
/// ...}`; a response without `success: true` is reported as
/// [`ProtocolError::Rejected`] carrying the response body.
///
/// # Examples
///
/// ```no_run
/// use arlo_lib::protocol::{HttpClient, HttpConfig};
///
/// # async fn example() -> arlo_lib::Result<()> {
/// let client = HttpClient::login(HttpConfig::new(), "user@example.com", "secret").await?;
/// let basestations = client.get_devices(Some("basestation")).await?;
/// println!("{} base station(s)", basestations.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
    session: Session,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

impl HttpClient {
    /// Logs in and returns a client bound to the new session.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` or
    /// `ProtocolError::Rejected` if the credentials are refused, and
    /// `ParseError` if the session cannot be read from the response.
    /// Returns `ProtocolError::InvalidAddress` if the base URL is not a
    /// valid HTTP(S) URL.
    pub async fn login(config: HttpConfig, email: &str, password: &str) -> Result<Self> {
        match reqwest::Url::parse(config.base_url()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ProtocolError::InvalidAddress(config.base_url().to_string()).into()),
        }

        // No client-wide timeout: it would cut the long-lived push channel.
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent())
            .connect_timeout(config.timeout())
            .build()
            .map_err(ProtocolError::Http)?;

        let url = format!("{}/login/v2", config.base_url());
        tracing::debug!(url = %url, "Logging in");

        let response = client
            .post(&url)
            .timeout(config.timeout())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| request_error(e, config.timeout()))?;

        let data = read_envelope(response, "Login").await?;
        let session: Session = serde_json::from_value(data).map_err(ParseError::from)?;

        tracing::info!(user_id = %session.user_id, "Logged in");

        Ok(Self {
            client,
            config,
            session,
        })
    }

    /// Returns the current session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the connection settings.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.config.base_url());
        tracing::debug!(method = %method, url = %url, "Sending HTTP request");
        self.client
            .request(method, url)
            .header(AUTHORIZATION, &self.session.token)
    }

    async fn call(&self, operation: &str, request: RequestBuilder) -> Result<Value> {
        let response = request
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| request_error(e, self.config.timeout()))?;
        Ok(read_envelope(response, operation).await?)
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let data = self.call(operation, request).await?;
        Ok(serde_json::from_value(data).map_err(ParseError::from)?)
    }

    /// Ends the session server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn logout(&self) -> Result<()> {
        self.call("Logout", self.request(Method::PUT, "/logout").json(&json!({})))
            .await?;
        tracing::info!(user_id = %self.session.user_id, "Logged out");
        Ok(())
    }

    /// Lists the account's devices, optionally only those of one type
    /// (e.g. `basestation`, `camera`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the list cannot be parsed.
    pub async fn get_devices(&self, device_type: Option<&str>) -> Result<Vec<Device>> {
        let devices: Vec<Device> = self
            .call_as("GetDevices", self.request(Method::GET, "/users/devices"))
            .await?;
        Ok(match device_type {
            Some(wanted) => devices.into_iter().filter(|d| d.is_type(wanted)).collect(),
            None => devices,
        })
    }

    /// Returns the account profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_profile(&self) -> Result<Value> {
        self.call("GetProfile", self.request(Method::GET, "/users/profile"))
            .await
    }

    /// Returns the server's view of the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_session(&self) -> Result<Value> {
        self.call("GetSession", self.request(Method::GET, "/users/session"))
            .await
    }

    /// Returns the account's locations (geofencing setup).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_locations(&self) -> Result<Value> {
        self.call("GetLocations", self.request(Method::GET, "/users/locations"))
            .await
    }

    /// Returns the account's service plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_service_level(&self) -> Result<Value> {
        self.call(
            "GetServiceLevel",
            self.request(Method::GET, "/users/serviceLevel"),
        )
        .await
    }

    /// Returns the subscription offers available to the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_payment_offers(&self) -> Result<Value> {
        self.call(
            "GetPaymentOffers",
            self.request(Method::GET, "/users/payment/offers"),
        )
        .await
    }

    /// Updates the account holder's name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn update_profile(&self, first_name: &str, last_name: &str) -> Result<Value> {
        let body = json!({"firstName": first_name, "lastName": last_name});
        self.call(
            "UpdateProfile",
            self.request(Method::PUT, "/users/profile").json(&body),
        )
        .await
    }

    /// Returns the users the account is shared with.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_friends(&self) -> Result<Value> {
        self.call("GetFriends", self.request(Method::GET, "/users/friends"))
            .await
    }

    /// Updates a shared user.
    ///
    /// `friend` is an entry as returned by [`get_friends`](Self::get_friends),
    /// e.g. with its `devices` map changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn update_friends(&self, friend: &Value) -> Result<Value> {
        self.call(
            "UpdateFriends",
            self.request(Method::PUT, "/users/friends").json(friend),
        )
        .await
    }

    /// Turns geofencing on or off for a location.
    ///
    /// `location_id` is the `id` of an entry from
    /// [`get_locations`](Self::get_locations). The service may turn
    /// geofencing off by itself when another mode is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn set_geofencing(&self, location_id: &str, active: bool) -> Result<Value> {
        let path = format!("/users/locations/{}", urlencoding::encode(location_id));
        self.call(
            "ToggleGeoFencing",
            self.request(Method::PUT, &path)
                .json(&json!({"geoEnabled": active})),
        )
        .await
    }

    /// Sets the order devices are listed in, from a
    /// `{"devices": {"<device id>": <position>, ...}}` body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn update_display_order(&self, order: &Value) -> Result<Value> {
        self.call(
            "UpdateDisplayOrder",
            self.request(Method::POST, "/users/devices/displayOrder")
                .json(order),
        )
        .await
    }

    /// Renames a device.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn update_device_name(&self, device: &Device, name: &str) -> Result<Value> {
        let body = json!({
            "deviceId": device.device_id(),
            "deviceName": name,
            "parentId": device.parent_id(),
        });
        self.call(
            "UpdateDeviceName",
            self.request(Method::PUT, "/users/devices/renameDevice")
                .json(&body),
        )
        .await
    }

    /// Resets the library's viewed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn reset_library(&self) -> Result<Value> {
        self.call("Reset", self.request(Method::GET, "/users/library/reset"))
            .await
    }

    /// Lists library recordings made between two dates, inclusive.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the list cannot be parsed.
    pub async fn get_library(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Recording>> {
        self.call_as(
            "GetLibrary",
            self.request(Method::POST, "/users/library")
                .json(&date_range(from, to)),
        )
        .await
    }

    /// Returns per-day library metadata between two dates, inclusive.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_library_metadata(&self, from: NaiveDate, to: NaiveDate) -> Result<Value> {
        self.call(
            "GetLibraryMetaData",
            self.request(Method::POST, "/users/library/metadata")
                .json(&date_range(from, to)),
        )
        .await
    }

    /// Moves one recording to the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn delete_recording(&self, recording: &Recording) -> Result<()> {
        self.recycle("DeleteRecording", std::slice::from_ref(recording))
            .await
    }

    /// Moves a batch of recordings to the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn batch_delete_recordings(&self, recordings: &[Recording]) -> Result<()> {
        self.recycle("BatchDeleteRecordings", recordings).await
    }

    async fn recycle(&self, operation: &str, recordings: &[Recording]) -> Result<()> {
        let keys: Vec<RecordingKey<'_>> = recordings.iter().map(RecordingKey::from).collect();
        self.call(
            operation,
            self.request(Method::POST, "/users/library/recycle")
                .json(&json!({ "data": keys })),
        )
        .await?;
        Ok(())
    }

    /// Starts a live stream and returns its `rtmps://` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no URL.
    pub async fn start_stream(&self, camera: &Device) -> Result<String> {
        let target = camera.parent_id().unwrap_or(camera.device_id());
        let mut command = Command::set(format!("cameras/{}", camera.device_id()))
            .publish_response(true)
            .with_properties(json!({
                "activityState": "startUserStream",
                "cameraId": camera.device_id(),
            }));
        command.stamp(&self.session.user_id, target);

        let data = self
            .call(
                "StartStream",
                self.request(Method::POST, "/users/devices/startStream")
                    .header(XCLOUD_ID, camera.xcloud_id())
                    .json(&command),
            )
            .await?;

        data.get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ParseError::MissingField("url".to_string()).into())
    }

    /// Starts a stream and takes a snapshot from it. Returns the stream URL.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails or is rejected.
    pub async fn take_snapshot(&self, camera: &Device) -> Result<String> {
        let url = self.start_stream(camera).await?;
        self.camera_action("TakeSnapshot", "/users/devices/takeSnapshot", camera)
            .await?;
        Ok(url)
    }

    /// Starts a stream and records it to the library. Returns the stream
    /// URL.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails or is rejected.
    pub async fn start_recording(&self, camera: &Device) -> Result<String> {
        let url = self.start_stream(camera).await?;
        self.camera_action("StartRecording", "/users/devices/startRecord", camera)
            .await?;
        Ok(url)
    }

    /// Stops a recording started with [`start_recording`](Self::start_recording).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn stop_recording(&self, camera: &Device) -> Result<Value> {
        self.camera_action("StopRecording", "/users/devices/stopRecord", camera)
            .await
    }

    async fn camera_action(&self, operation: &str, path: &str, camera: &Device) -> Result<Value> {
        let body = json!({
            "xcloudId": camera.xcloud_id(),
            "parentId": camera.parent_id(),
            "deviceId": camera.device_id(),
            "olsonTimeZone": camera.olson_time_zone(),
        });
        self.call(
            operation,
            self.request(Method::POST, path)
                .header(XCLOUD_ID, camera.xcloud_id())
                .json(&body),
        )
        .await
    }
}

impl Transport for HttpClient {
    fn user_id(&self) -> &str {
        &self.session.user_id
    }

    async fn notify(&self, device: &Device, command: &Command) -> std::result::Result<(), ProtocolError> {
        let path = format!("/users/devices/notify/{}", device.device_id());
        let response = self
            .request(Method::POST, &path)
            .header(XCLOUD_ID, device.xcloud_id())
            .timeout(self.config.timeout())
            .json(command)
            .send()
            .await
            .map_err(|e| request_error(e, self.config.timeout()))?;
        read_envelope(response, "Notify").await?;
        Ok(())
    }

    async fn unsubscribe(&self) -> std::result::Result<(), ProtocolError> {
        let response = self
            .request(Method::GET, "/client/unsubscribe")
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| request_error(e, self.config.timeout()))?;
        read_envelope(response, "Unsubscribe").await?;
        Ok(())
    }

    async fn open_push_channel(&self) -> std::result::Result<PushStream, ProtocolError> {
        let path = format!(
            "/client/subscribe?token={}",
            urlencoding::encode(&self.session.token)
        );
        let response = self
            .request(Method::GET, &path)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        check_status(&response)?;

        tracing::debug!("Push channel opened");
        Ok(sse::decode(response.bytes_stream()).boxed())
    }
}

/// Maps a failed send, reporting timeouts as such.
fn request_error(err: reqwest::Error, timeout: Duration) -> ProtocolError {
    if err.is_timeout() {
        ProtocolError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    } else {
        ProtocolError::Http(err)
    }
}

fn check_status(response: &Response) -> std::result::Result<(), ProtocolError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ProtocolError::AuthenticationFailed);
    }
    if !status.is_success() {
        return Err(ProtocolError::ConnectionFailed(format!(
            "HTTP {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }
    Ok(())
}

/// Checks the status and envelope of an API response and returns its
/// `data` (`null` if absent).
async fn read_envelope(
    response: Response,
    operation: &str,
) -> std::result::Result<Value, ProtocolError> {
    check_status(&response)?;
    let body = response.text().await?;
    tracing::debug!(operation, body = %body, "Received HTTP response");

    match serde_json::from_str::<Envelope>(&body) {
        Ok(Envelope {
            success: true,
            data,
        }) => Ok(data.unwrap_or(Value::Null)),
        _ => Err(ProtocolError::Rejected {
            operation: operation.to_string(),
            reason: body,
        }),
    }
}

fn date_range(from: NaiveDate, to: NaiveDate) -> Value {
    json!({
        "dateFrom": from.format("%Y%m%d").to_string(),
        "dateTo": to.format("%Y%m%d").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url(), "https://arlo.netgear.com/hmsweb");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.user_agent().starts_with("arlo_lib/"));
    }

    #[test]
    fn config_trims_trailing_slash() {
        let config = HttpConfig::new().with_base_url("http://localhost:1234/hmsweb/");
        assert_eq!(config.base_url(), "http://localhost:1234/hmsweb");
    }

    #[test]
    fn config_builder_chain() {
        let config = HttpConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent(), "test-agent");
    }

    #[tokio::test]
    async fn login_rejects_invalid_base_url() {
        let config = HttpConfig::new().with_base_url("arlo.netgear.com/hmsweb");
        let result = HttpClient::login(config, "user@example.com", "secret").await;
        assert!(matches!(
            result,
            Err(crate::error::Error::Protocol(ProtocolError::InvalidAddress(_)))
        ));
    }

    #[test]
    fn date_range_format() {
        let from = NaiveDate::from_ymd_opt(2016, 9, 3).unwrap();
        let to = NaiveDate::from_ymd_opt(2016, 10, 12).unwrap();
        assert_eq!(
            date_range(from, to),
            json!({"dateFrom": "20160903", "dateTo": "20161012"})
        );
    }

    #[test]
    fn session_debug_hides_token() {
        let session: Session = serde_json::from_value(json!({
            "userId": "U1",
            "email": "a@b.c",
            "token": "secret-token",
            "accountStatus": "registered"
        }))
        .unwrap();
        let debug = format!("{session:?}");
        assert!(debug.contains("U1"));
        assert!(!debug.contains("secret-token"));
        assert_eq!(session.account_status(), Some("registered"));
        assert!(session.country_code().is_none());
    }
}
