use crate::{Error, Result};
use serde::Deserialize;

const TOKEN_SCOPE: &str = "https://management.azure.com/.default";

/// Service-principal credentials read from the conventional environment
/// variables.
pub struct EnvironmentCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl EnvironmentCredential {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tenant_id: require("AZURE_TENANT_ID")?,
            client_id: require("AZURE_CLIENT_ID")?,
            client_secret: require("AZURE_CLIENT_SECRET")?,
        })
    }

    /// Exchange the credentials for a management-plane bearer token.
    pub(crate) async fn fetch_token(&self, http: &reqwest::Client) -> Result<String> {
        let url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        );
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", TOKEN_SCOPE),
        ];
        let response = http.post(&url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

fn require(var: &'static str) -> Result<String> {
    std::env::var(var).map_err(|_| Error::MissingCredential(var))
}
