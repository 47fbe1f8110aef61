//! Column widths from the schema. Inputs are checked against these before
//! insert so both stores reject the same values.

pub const NAME_MAX: usize = 100;
pub const SCHOOL_MAX: usize = 100;
pub const SCHOOL_CODE_MAX: usize = 10;
pub const STUDENT_ID_MAX: usize = 20;
pub const ROLL_NO_MAX: usize = 20;
pub const CLASS_NAME_MAX: usize = 50;
pub const SECTION_MAX: usize = 10;
pub const DEPARTMENT_MAX: usize = 50;
