use crate::api::{
    self, CreateRideRequest, CreateRideResponse, Envelope, PriceData, PriceQuery, RideApi,
    StatusUpdate,
};
use async_trait::async_trait;
use reqwest::{
    Method, Response, Url,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// `RideApi` over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRideApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRideApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, api::Error> {
        let body = serde_json::to_vec(body)?;
        let response = self
            .client
            .request(method, self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;
        check(response).await
    }
}

async fn check(response: Response) -> Result<Response, api::Error> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(api::Error::Status { status, body })
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, api::Error> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl RideApi for HttpRideApi {
    async fn price(&self, query: &PriceQuery) -> Result<PriceData, api::Error> {
        let url = Url::parse_with_params(&self.url("/rides/price"), query.params())
            .map_err(|err| api::Error::Url(err.to_string()))?;
        debug!(%url, "Requesting price");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let envelope: Envelope<PriceData> = parse(check(response).await?).await?;
        Ok(envelope.data)
    }

    async fn create_ride(
        &self,
        request: &CreateRideRequest,
    ) -> Result<CreateRideResponse, api::Error> {
        let response = self.send_json(Method::POST, "/rides", request).await?;
        parse(response).await
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<(), api::Error> {
        let response = self
            .send_json(Method::PUT, "/rides/status", update)
            .await?;
        // The acknowledgement body carries nothing we use
        let _ = response.bytes().await?;
        Ok(())
    }
}
