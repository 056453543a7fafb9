//! # Bulletin Domain Models
//!
//! Data types shared by the report-card pipelines.
//!
//! ## Key Models
//!
//! - **Layout**: column structure and curriculum-unit grouping of one program/semester
//! - **StudentRecord**: one row of the administrative export
//! - **GradeEntry / SubjectResult / UnitResult**: the grade aggregation chain
//! - **PlaceholderMap**: the flat record bound into a report template
//! - **Apprenant / Groupe / Absence**: records returned by the student-information system
//!
//! Layouts are static configuration shared across requests. Every other model
//! lives for the processing of a single student row.

pub mod layout;
pub mod student;
pub mod grade;
pub mod placeholder;
pub mod ypareo;

pub use layout::*;
pub use student::*;
pub use grade::*;
pub use placeholder::*;
pub use ypareo::*;
