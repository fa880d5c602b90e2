//! 活动表单解析与校验

use axum::extract::Multipart;
use serde::Deserialize;
use shared::models::{Event, EventCreate, EventUpdate};
use shared::util::parse_timestamp;

use crate::utils::error::multipart_error;
use crate::utils::{AppError, AppResult, ErrorCode};

/// 上传的文件部分
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// multipart 活动表单
#[derive(Default)]
pub struct EventForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub poster: Option<UploadedFile>,
}

impl EventForm {
    /// 读取全部字段；`poster` / `file` 为海报文件
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "poster" | "file" => {
                    let Some(file_name) = field.file_name().map(str::to_string) else {
                        // 空的文件输入框
                        continue;
                    };
                    let data = field.bytes().await.map_err(multipart_error)?.to_vec();
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    if file_name.is_empty() {
                        return Err(AppError::new(ErrorCode::NoFilename));
                    }
                    form.poster = Some(UploadedFile { file_name, data });
                }
                "name" | "description" | "start_time" | "end_time" => {
                    let value = field.text().await.map_err(multipart_error)?;
                    let slot = match name.as_str() {
                        "name" => &mut form.name,
                        "description" => &mut form.description,
                        "start_time" => &mut form.start_time,
                        _ => &mut form.end_time,
                    };
                    *slot = Some(value);
                }
                other => {
                    tracing::debug!(field = %other, "Ignoring unknown event form field");
                }
            }
        }

        Ok(form)
    }

    /// 校验并转换为创建载荷
    pub fn into_create(self) -> AppResult<(EventCreate, Option<UploadedFile>)> {
        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(fields_required("name"));
        }
        let start_time = required_time(self.start_time.as_deref(), "start_time")?;
        let end_time = required_time(self.end_time.as_deref(), "end_time")?;
        check_range(start_time, end_time)?;

        let create = EventCreate {
            name: name.to_string(),
            description: normalize_description(self.description),
            start_time: Some(start_time),
            end_time: Some(end_time),
        };
        Ok((create, self.poster))
    }
}

/// 时间字段可以是毫秒数或文本
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    Millis(i64),
    Text(String),
}

impl TimeInput {
    fn resolve(&self, field: &'static str) -> AppResult<i64> {
        match self {
            Self::Millis(ms) => Ok(*ms),
            Self::Text(text) => parse_timestamp(text).ok_or_else(|| invalid_time(field)),
        }
    }
}

/// PUT /api/events/{id} 的 JSON 载荷
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<TimeInput>,
    pub end_time: Option<TimeInput>,
}

impl EventUpdateRequest {
    /// 与当前值合并后校验
    pub fn into_update(self, current: &Event) -> AppResult<EventUpdate> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => return Err(fields_required("name")),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let start_time = self
            .start_time
            .map(|t| t.resolve("start_time"))
            .transpose()?;
        let end_time = self.end_time.map(|t| t.resolve("end_time")).transpose()?;

        check_range(
            start_time.unwrap_or(current.start_time),
            end_time.unwrap_or(current.end_time),
        )?;

        Ok(EventUpdate {
            name,
            description: self.description.map(|d| d.trim().to_string()),
            start_time,
            end_time,
        })
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn required_time(value: Option<&str>, field: &'static str) -> AppResult<i64> {
    match value.map(str::trim) {
        None | Some("") => Err(fields_required(field)),
        Some(text) => parse_timestamp(text).ok_or_else(|| invalid_time(field)),
    }
}

fn check_range(start_time: i64, end_time: i64) -> AppResult<()> {
    if end_time < start_time {
        return Err(AppError::new(ErrorCode::EventTimeRange)
            .with_detail("start_time", start_time)
            .with_detail("end_time", end_time));
    }
    Ok(())
}

fn fields_required(field: &'static str) -> AppError {
    AppError::new(ErrorCode::EventFieldsRequired).with_detail("field", field)
}

fn invalid_time(field: &'static str) -> AppError {
    AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid {field}"))
        .with_detail("field", field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, start: &str, end: &str) -> EventForm {
        EventForm {
            name: Some(name.into()),
            description: Some("  ".into()),
            start_time: Some(start.into()),
            end_time: Some(end.into()),
            poster: None,
        }
    }

    #[test]
    fn test_create_requires_fields() {
        let err = form(" ", "2024-01-01T10:00", "2024-01-01T12:00")
            .into_create()
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::EventFieldsRequired);

        let err = form("Expo", "", "2024-01-01T12:00").into_create().err().unwrap();
        assert_eq!(err.code, ErrorCode::EventFieldsRequired);

        let err = form("Expo", "soon", "2024-01-01T12:00").into_create().err().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_create_checks_range() {
        let err = form("Expo", "2024-01-01T12:00", "2024-01-01T10:00")
            .into_create()
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::EventTimeRange);

        let (create, poster) = form("Expo", "2024-01-01T10:00", "2024-01-01T12:00")
            .into_create()
            .unwrap();
        assert_eq!(create.name, "Expo");
        assert_eq!(create.description, None);
        assert_eq!(create.start_time, Some(1_704_103_200_000));
        assert!(poster.is_none());
    }

    #[test]
    fn test_update_merges_with_current() {
        let current = Event {
            id: 1,
            name: "Expo".into(),
            description: None,
            start_time: 1_000,
            end_time: 2_000,
            poster_url: None,
            created_at: 0,
            updated_at: 0,
        };

        let request: EventUpdateRequest = serde_json::from_str(r#"{"end_time": 500}"#).unwrap();
        assert_eq!(
            request.into_update(&current).unwrap_err().code,
            ErrorCode::EventTimeRange
        );

        let request: EventUpdateRequest =
            serde_json::from_str(r#"{"name": " Fair ", "start_time": "1970-01-01T00:00:01.500Z"}"#)
                .unwrap();
        let update = request.into_update(&current).unwrap();
        assert_eq!(update.name.as_deref(), Some("Fair"));
        assert_eq!(update.start_time, Some(1_500));
        assert_eq!(update.end_time, None);
    }
}
