mod mapper_error;

pub use mapper_error::{MapperError, MapperResult};
