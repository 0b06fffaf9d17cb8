// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builder for logged-in clients.

use std::time::Duration;

use super::Arlo;
use crate::error::{Error, Result};
use crate::manager::SubscriptionConfig;
use crate::protocol::{HttpClient, HttpConfig};

/// Builder for an [`Arlo`] client over HTTP.
///
/// # Examples
///
/// ```no_run
/// use arlo_lib::Arlo;
/// use std::time::Duration;
///
/// # async fn example() -> arlo_lib::Result<()> {
/// let arlo = Arlo::builder()
///     .credentials("user@example.com", "secret")
///     .timeout(Duration::from_secs(10))
///     .response_timeout(Duration::from_secs(30))
///     .login()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ArloBuilder {
    email: Option<String>,
    password: Option<String>,
    http: HttpConfig,
    subscription: SubscriptionConfig,
}

impl ArloBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }

    /// Replaces the HTTP settings.
    #[must_use]
    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http = config;
        self
    }

    /// Replaces the subscription timing.
    #[must_use]
    pub fn subscription_config(mut self, config: SubscriptionConfig) -> Self {
        self.subscription = config;
        self
    }

    /// Sets the API root.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// Sets the timeout for API calls.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Sets the default deadline for command replies.
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.subscription = self.subscription.with_response_timeout(timeout);
        self
    }

    /// Logs in and returns the client.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingCredentials` if no credentials were set, or
    /// the login error.
    pub async fn login(self) -> Result<Arlo<HttpClient>> {
        let (Some(email), Some(password)) = (self.email, self.password) else {
            return Err(Error::MissingCredentials);
        };
        let client = HttpClient::login(self.http, &email, &password).await?;
        Ok(Arlo::with_config(client, self.subscription))
    }
}
