use reqwest::Client as ReqwestClient;
use serde_json::Value;
use std::time::Duration;

use common::errors::SourceError;

const CLIENT_TIMEOUT_DEFAULT: u64 = 5;

pub(crate) struct HttpClient {
    client: ReqwestClient,
    base_url: String,
}

impl HttpClient {
    pub(crate) fn new(base_url: &str) -> Result<Self, SourceError> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_DEFAULT))
            .build()
            .map_err(|e| SourceError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn fetch_json(&self, path: &str) -> Result<Value, SourceError> {
        // Example of data returned by Phyphox
        //  /get?acc_time=2.0412&accX=2.0412|acc_time&accY=2.0412|acc_time&accZ=2.0412|acc_time,
        // {"buffer":{"accX":{"buffer":[0.17797988891601563,0.16510665893554688],"size":0,"updateMode":"partial"},
        //            "accY":{"buffer":[0.2908451843261719,0.26614654541015625],"size":0,"updateMode":"partial"},
        //            "accZ":{"buffer":[9.756411437988282,9.761650543212891],"size":0,"updateMode":"partial"},
        //            "acc_time":{"buffer":[2.5006562499329448,3.001219541300088],"size":0,"updateMode":"partial"}},
        // "status":{"countDown":0,"measuring":true,"session":"11114880","timedRun":false}}
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SourceError::FetchData(e.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| SourceError::IncorrectDataFormat(e.to_string()))
    }
}
