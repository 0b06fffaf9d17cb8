// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Library recording metadata.

use serde::{Deserialize, Serialize};

/// A recording listed in the media library.
///
/// Only the fields needed to identify and delete a recording are required;
/// the rest are informational and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Camera that produced the recording.
    pub device_id: String,
    /// Local creation date, `YYYYMMDD`.
    pub created_date: String,
    /// Creation time in Unix milliseconds.
    pub utc_created_date: i64,
    /// Recording name.
    #[serde(default)]
    pub name: Option<String>,
    /// MIME type of the media, e.g. `video/mp4`.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub media_duration_second: Option<u32>,
    /// Why the recording was made, e.g. `motionRecord`.
    #[serde(default)]
    pub reason: Option<String>,
    /// Time-limited URL of the media file.
    #[serde(default)]
    pub presigned_content_url: Option<String>,
    /// Time-limited URL of the thumbnail.
    #[serde(default)]
    pub presigned_thumbnail_url: Option<String>,
}

/// Identifies a recording in a delete request.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordingKey<'a> {
    pub created_date: &'a str,
    pub utc_created_date: i64,
    pub device_id: &'a str,
}

#[cfg(feature = "http")]
impl<'a> From<&'a Recording> for RecordingKey<'a> {
    fn from(recording: &'a Recording) -> Self {
        Self {
            created_date: &recording.created_date,
            utc_created_date: recording.utc_created_date,
            device_id: &recording.device_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_library_entry() {
        let recording: Recording = serde_json::from_value(json!({
            "mediaDurationSecond": 30,
            "contentType": "video/mp4",
            "name": "1472881430181",
            "presignedContentUrl": "https://example.com/a.mp4",
            "reason": "motionRecord",
            "deviceId": "CAM1",
            "createdDate": "20160903",
            "utcCreatedDate": 1_472_881_430_181_i64,
            "currentState": "new"
        }))
        .unwrap();

        assert_eq!(recording.device_id, "CAM1");
        assert_eq!(recording.media_duration_second, Some(30));
        assert!(recording.presigned_thumbnail_url.is_none());
    }

    #[cfg(feature = "http")]
    #[test]
    fn key_serializes_identifying_fields_only() {
        let recording = Recording {
            device_id: "CAM1".to_string(),
            created_date: "20160904".to_string(),
            utc_created_date: 1_473_010_280_395,
            name: Some("x".to_string()),
            content_type: None,
            media_duration_second: None,
            reason: None,
            presigned_content_url: None,
            presigned_thumbnail_url: None,
        };
        assert_eq!(
            serde_json::to_value(RecordingKey::from(&recording)).unwrap(),
            json!({
                "createdDate": "20160904",
                "utcCreatedDate": 1_473_010_280_395_i64,
                "deviceId": "CAM1"
            })
        );
    }
}
