use crate::api::attendance::{
    AttendanceQuery, MarkAttendance, RecordInput, ResolvedRecord, ResolvedSheetResponse,
    SheetRecord, SheetResponse, StudentDayStatus,
};
use crate::api::fee::{CreateFee, FeeWithStudent};
use crate::api::school::{CreateSchool, SchoolWithAdmin, SubscriptionPlan};
use crate::api::student::{CreateStudent, StudentWithUser};
use crate::api::teacher::{CreateTeacher, TeacherWithUser};
use crate::model::attendance::AttendanceStatus;
use crate::model::fee::Fee;
use crate::model::school::School;
use crate::models::{LoginReqDto, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Management API",
        version = "1.0.0",
        description = r#"
## Multi-tenant School Management System

Tenancy is by school; roles (superadmin, admin, teacher, student, parent)
gate access to every resource.

### Key Features
- **Attendance Register**
  - One sheet per class/section per calendar day, per-student status
- **Rosters**
  - Student and teacher onboarding, school-wide listings
- **Fees**
  - Fee records, payment marking, per-student views
- **Schools**
  - Superadmin provisioning of schools with their admin account

### Security
Endpoints are protected with **JWT Bearer authentication**; each route
declares the roles it accepts.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::school::create_school,
        crate::api::school::get_schools,

        crate::api::student::create_student,
        crate::api::student::get_students,

        crate::api::teacher::create_teacher,
        crate::api::teacher::get_teachers,

        crate::api::fee::create_fee,
        crate::api::fee::get_fees,
        crate::api::fee::pay_fee,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::get_student_attendance
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            CreateSchool,
            SubscriptionPlan,
            School,
            SchoolWithAdmin,
            CreateStudent,
            StudentWithUser,
            CreateTeacher,
            TeacherWithUser,
            CreateFee,
            Fee,
            FeeWithStudent,
            AttendanceStatus,
            MarkAttendance,
            RecordInput,
            SheetRecord,
            SheetResponse,
            ResolvedRecord,
            ResolvedSheetResponse,
            AttendanceQuery,
            StudentDayStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Registration, login and session APIs"),
        (name = "Schools", description = "School provisioning APIs"),
        (name = "Students", description = "Student roster APIs"),
        (name = "Teachers", description = "Teacher roster APIs"),
        (name = "Fees", description = "Fee management APIs"),
        (name = "Attendance", description = "Attendance register APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
