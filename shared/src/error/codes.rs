//! Unified error codes for the queue service
//!
//! Error codes are shared by queue-server and the browser views.
//! They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Event errors
//! - 4xxx: Reservation errors
//! - 5xxx: Payment errors
//! - 6xxx: Storage (poster upload) errors
//! - 7xxx: Analytics errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can
/// switch on a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Session has expired (admin removed from store)
    SessionExpired = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin session required
    AdminRequired = 2002,

    // ==================== 3xxx: Event ====================
    /// No event was selected for the booking
    EventNotSelected = 3001,
    /// Event not found
    EventNotFound = 3002,
    /// Event name / start / end missing
    EventFieldsRequired = 3003,
    /// Event ends before it starts
    EventTimeRange = 3004,

    // ==================== 4xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 4001,
    /// Visitor name is required
    NameRequired = 4002,
    /// Queue number could not be assigned (lost every race)
    QueueNumberConflict = 4003,
    /// Reservation has already been paid
    ReservationAlreadyPaid = 4004,
    /// Reservation is not pending
    ReservationNotPending = 4005,

    // ==================== 5xxx: Payment ====================
    /// Payment amount must be positive
    PaymentInvalidAmount = 5002,
    /// Slip verification relay failed
    SlipRelayFailed = 5003,

    // ==================== 6xxx: Storage ====================
    /// File too large
    FileTooLarge = 6001,
    /// Unsupported file format
    UnsupportedFileFormat = 6002,
    /// Invalid/corrupted image file
    InvalidImageFile = 6003,
    /// No file provided in request
    NoFileProvided = 6004,
    /// Empty file provided
    EmptyFile = 6005,
    /// No filename provided
    NoFilename = 6006,
    /// Invalid file extension
    InvalidFileExtension = 6007,
    /// Image processing failed
    ImageProcessingFailed = 6008,
    /// File storage failed
    FileStorageFailed = 6009,
    /// Poster not found
    PosterNotFound = 6010,

    // ==================== 7xxx: Analytics ====================
    /// Unknown time range filter
    InvalidTimeRange = 7001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Client disconnected
    ClientDisconnected = 9301,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::SessionExpired => "Session has expired",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Admin session required",

            // Event
            ErrorCode::EventNotSelected => "Please select an event",
            ErrorCode::EventNotFound => "Event not found",
            ErrorCode::EventFieldsRequired => "Event name, start time and end time are required",
            ErrorCode::EventTimeRange => "Event end time must not be before its start time",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::NameRequired => "Please enter your name",
            ErrorCode::QueueNumberConflict => "Could not assign a queue number, please retry",
            ErrorCode::ReservationAlreadyPaid => "Reservation has already been paid",
            ErrorCode::ReservationNotPending => "Reservation is not pending",

            // Payment
            ErrorCode::PaymentInvalidAmount => "Payment amount must be greater than zero",
            ErrorCode::SlipRelayFailed => "Slip verification failed",

            // Storage
            ErrorCode::FileTooLarge => "File is too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid or corrupted image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "File is empty",
            ErrorCode::NoFilename => "No filename provided",
            ErrorCode::InvalidFileExtension => "Invalid file extension",
            ErrorCode::ImageProcessingFailed => "Image processing failed",
            ErrorCode::FileStorageFailed => "Failed to store file",
            ErrorCode::PosterNotFound => "Poster not found",

            // Analytics
            ErrorCode::InvalidTimeRange => "Unknown time range filter",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ClientDisconnected => "Client disconnected",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::SessionExpired),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::AdminRequired),

            // Event
            3001 => Ok(ErrorCode::EventNotSelected),
            3002 => Ok(ErrorCode::EventNotFound),
            3003 => Ok(ErrorCode::EventFieldsRequired),
            3004 => Ok(ErrorCode::EventTimeRange),

            // Reservation
            4001 => Ok(ErrorCode::ReservationNotFound),
            4002 => Ok(ErrorCode::NameRequired),
            4003 => Ok(ErrorCode::QueueNumberConflict),
            4004 => Ok(ErrorCode::ReservationAlreadyPaid),
            4005 => Ok(ErrorCode::ReservationNotPending),

            // Payment
            5002 => Ok(ErrorCode::PaymentInvalidAmount),
            5003 => Ok(ErrorCode::SlipRelayFailed),

            // Storage
            6001 => Ok(ErrorCode::FileTooLarge),
            6002 => Ok(ErrorCode::UnsupportedFileFormat),
            6003 => Ok(ErrorCode::InvalidImageFile),
            6004 => Ok(ErrorCode::NoFileProvided),
            6005 => Ok(ErrorCode::EmptyFile),
            6006 => Ok(ErrorCode::NoFilename),
            6007 => Ok(ErrorCode::InvalidFileExtension),
            6008 => Ok(ErrorCode::ImageProcessingFailed),
            6009 => Ok(ErrorCode::FileStorageFailed),
            6010 => Ok(ErrorCode::PosterNotFound),

            // Analytics
            7001 => Ok(ErrorCode::InvalidTimeRange),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9301 => Ok(ErrorCode::ClientDisconnected),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
