//! Remote describe client — fan-out to non-local partitions
//!
//! Partitions 1..N-1 live on other hosts; the scaler reaches them through
//! this client. The transport behind it is out of scope here — any error,
//! including timeouts and not-found, just means the partition's load is
//! unknown this tick.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{MatchingError, Result};
use crate::tasklist::identifier::TaskType;
use crate::tasklist::types::DescribeResponse;

/// Request to describe one task-list partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeTaskListRequest {
    /// Owning domain id
    pub domain_id: String,
    /// Transport-visible partition name
    pub task_list_name: String,
    /// Task type of the list
    pub task_type: TaskType,
    /// Whether to include load status in the response
    pub include_status: bool,
}

/// Client for describing non-local partitions
#[async_trait]
pub trait RemoteMatchingClient: Send + Sync {
    /// Describe the named partition
    async fn describe_task_list(
        &self,
        request: &DescribeTaskListRequest,
    ) -> Result<DescribeResponse>;
}

/// Scripted in-memory remote client.
///
/// Responses are queued per partition name; an unscripted describe fails,
/// which surfaces unexpected fan-out in tests.
#[derive(Debug, Default)]
pub struct InMemoryRemoteClient {
    responses: Mutex<HashMap<String, VecDeque<Result<DescribeResponse>>>>,
    requests: Mutex<Vec<DescribeTaskListRequest>>,
}

impl InMemoryRemoteClient {
    /// Create a client with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response for a partition name
    pub fn enqueue_response(&self, task_list_name: impl Into<String>, response: DescribeResponse) {
        self.responses
            .lock()
            .unwrap()
            .entry(task_list_name.into())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queue a failure for a partition name
    pub fn enqueue_error(&self, task_list_name: impl Into<String>, reason: impl Into<String>) {
        let name = task_list_name.into();
        let err = MatchingError::observation(name.clone(), reason.into());
        self.responses
            .lock()
            .unwrap()
            .entry(name)
            .or_default()
            .push_back(Err(err));
    }

    /// All requests received, in arrival order
    pub fn requests(&self) -> Vec<DescribeTaskListRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteMatchingClient for InMemoryRemoteClient {
    async fn describe_task_list(
        &self,
        request: &DescribeTaskListRequest,
    ) -> Result<DescribeResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&request.task_list_name)
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(result) => result,
            None => Err(MatchingError::observation(
                request.task_list_name.clone(),
                "no response scripted",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> DescribeTaskListRequest {
        DescribeTaskListRequest {
            domain_id: "dom".into(),
            task_list_name: name.into(),
            task_type: TaskType::Decision,
            include_status: true,
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_served_in_order() {
        let client = InMemoryRemoteClient::new();
        client.enqueue_response("orders/__1", DescribeResponse::with_qps(100.0));
        client.enqueue_response("orders/__1", DescribeResponse::with_qps(200.0));

        let first = client.describe_task_list(&request("orders/__1")).await.unwrap();
        let second = client.describe_task_list(&request("orders/__1")).await.unwrap();
        assert_eq!(first.status.new_tasks_per_second, 100.0);
        assert_eq!(second.status.new_tasks_per_second, 200.0);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let client = InMemoryRemoteClient::new();
        client.enqueue_error("orders/__2", "deadline exceeded");

        let err = client
            .describe_task_list(&request("orders/__2"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[tokio::test]
    async fn test_unscripted_describe_fails() {
        let client = InMemoryRemoteClient::new();
        let err = client
            .describe_task_list(&request("orders/__9"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no response scripted"));
    }

    #[tokio::test]
    async fn test_requests_recorded() {
        let client = InMemoryRemoteClient::new();
        client.enqueue_response("orders/__1", DescribeResponse::default());
        let _ = client.describe_task_list(&request("orders/__1")).await;

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].task_list_name, "orders/__1");
        assert!(requests[0].include_status);
    }

    #[test]
    fn test_request_serialization() {
        let req = request("orders/__1");
        let json = serde_json::to_string(&req).unwrap();
        let parsed: DescribeTaskListRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }
}
