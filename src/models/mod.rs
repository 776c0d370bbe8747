pub mod user;
pub mod student;
pub mod exam;
pub mod seat;
pub mod car;
pub mod booking;
pub mod wallet;

pub use user::User;
pub use student::Student;
pub use exam::Exam;
pub use seat::{NewSeatAssignment, SeatAssignment, SeatRule};
pub use car::Car;
pub use booking::Booking;
pub use wallet::WalletTransaction;
