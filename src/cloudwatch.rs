use crate::error::TailError;
use crate::source::{LogSource, STREAM_LIMIT};
use crate::types::{LogEvent, LogGroup, LogStream};
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::config::Region;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::OrderBy;
use tracing::{debug, info};

const FALLBACK_REGION: &str = "us-west-2";

/// CloudWatch Logs backed `LogSource`.
#[derive(Clone)]
pub struct CloudWatchSource {
    client: Client,
}

impl CloudWatchSource {
    /// Load the AWS config (env, profile, instance role) and make sure
    /// credentials actually resolve before anything else runs.
    pub async fn connect(region: Option<String>, profile: Option<String>) -> Result<Self, TailError> {
        let region_chain = RegionProviderChain::first_try(region.map(Region::new))
            .or_default_provider()
            .or_else(Region::new(FALLBACK_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_chain);
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        debug!("Retrieving and testing AWS credentials");
        let provider = config
            .credentials_provider()
            .ok_or_else(|| TailError::Credentials("no credentials provider configured".into()))?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| TailError::Credentials(DisplayErrorContext(e).to_string()))?;

        info!(
            "Validated AWS credentials, using region {}",
            config.region().map(|r| r.as_ref()).unwrap_or(FALLBACK_REGION)
        );

        Ok(Self {
            client: Client::new(&config),
        })
    }
}

#[async_trait::async_trait]
impl LogSource for CloudWatchSource {
    async fn list_groups(&self) -> Result<Vec<LogGroup>, TailError> {
        let mut pages = self
            .client
            .describe_log_groups()
            .into_paginator()
            .items()
            .send();

        let mut groups = Vec::new();
        while let Some(group) = pages.next().await {
            let group = group
                .map_err(|e| TailError::transport("DescribeLogGroups", DisplayErrorContext(e)))?;
            groups.push(LogGroup {
                name: group.log_group_name().unwrap_or_default().to_string(),
                arn: group.arn().map(str::to_string),
                creation_time: group.creation_time(),
                retention_in_days: group.retention_in_days(),
                stored_bytes: group.stored_bytes(),
                metric_filter_count: group.metric_filter_count(),
            });
        }
        debug!("Listed {} log groups", groups.len());
        Ok(groups)
    }

    async fn list_streams(&self, group: &LogGroup) -> Result<Vec<LogStream>, TailError> {
        let resp = self
            .client
            .describe_log_streams()
            .log_group_name(&group.name)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .limit(STREAM_LIMIT)
            .send()
            .await
            .map_err(|e| TailError::transport("DescribeLogStreams", DisplayErrorContext(e)))?;

        Ok(resp
            .log_streams()
            .iter()
            .map(|s| LogStream {
                name: s.log_stream_name().unwrap_or_default().to_string(),
                last_event_timestamp: s.last_event_timestamp(),
                arn: s.arn().map(str::to_string),
                creation_time: s.creation_time(),
                first_event_timestamp: s.first_event_timestamp(),
                last_ingestion_time: s.last_ingestion_time(),
            })
            .collect())
    }

    async fn get_events(
        &self,
        group: &LogGroup,
        stream: &LogStream,
        limit: usize,
    ) -> Result<Vec<LogEvent>, TailError> {
        // GetLogEvents caps a page at 10,000 events.
        let limit = i32::try_from(limit).unwrap_or(i32::MAX).min(10_000);
        let resp = self
            .client
            .get_log_events()
            .log_group_name(&group.name)
            .log_stream_name(&stream.name)
            .limit(limit)
            .send()
            .await
            .map_err(|e| TailError::transport("GetLogEvents", DisplayErrorContext(e)))?;

        Ok(resp
            .events()
            .iter()
            .map(|e| LogEvent {
                timestamp: e.timestamp().unwrap_or_default(),
                message: e.message().unwrap_or_default().to_string(),
                ingestion_time: e.ingestion_time(),
            })
            .collect())
    }
}
