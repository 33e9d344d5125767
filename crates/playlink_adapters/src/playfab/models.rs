//! Wire types for the PlayFab Client API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by every Client API call
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: u16,
    #[serde(default)]
    pub status: String,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(rename = "errorCode")]
    pub error_code: Option<i64>,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginWithEmailAddressRequest<'a> {
    pub title_id: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginWithAndroidDeviceIdRequest<'a> {
    pub title_id: &'a str,
    #[serde(rename = "AndroidDeviceId")]
    pub android_device_id: &'a str,
    pub create_account: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginWithIosDeviceIdRequest<'a> {
    pub title_id: &'a str,
    pub device_id: &'a str,
    pub create_account: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginWithCustomIdRequest<'a> {
    pub title_id: &'a str,
    #[serde(rename = "CustomId")]
    pub custom_id: &'a str,
    pub create_account: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginResult {
    pub session_ticket: String,
    #[serde(rename = "PlayFabId")]
    pub playfab_id: String,
    #[serde(default)]
    pub newly_created: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterPlayFabUserRequest<'a> {
    pub title_id: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    pub require_both_username_and_email: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterPlayFabUserResult {
    pub session_ticket: String,
    #[serde(rename = "PlayFabId")]
    pub playfab_id: String,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddUsernamePasswordRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddUsernamePasswordResult {
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StatisticUpdate {
    pub statistic_name: String,
    pub value: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatePlayerStatisticsRequest {
    pub statistics: Vec<StatisticUpdate>,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct GetPlayerStatisticsRequest {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatisticEntry {
    pub statistic_name: String,
    pub value: i32,
    #[serde(default)]
    pub version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetPlayerStatisticsResult {
    #[serde(default)]
    pub statistics: Vec<StatisticEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecuteCloudScriptRequest<'a> {
    pub function_name: &'a str,
    pub function_parameter: &'a Value,
    pub generate_play_stream_event: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogStatement {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScriptExecutionError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecuteCloudScriptResult {
    #[serde(default)]
    pub function_name: String,
    pub function_result: Option<Value>,
    #[serde(default)]
    pub logs: Vec<LogStatement>,
    pub error: Option<ScriptExecutionError>,
}
