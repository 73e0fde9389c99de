mod server;
mod show;

pub use server::serve;
pub use show::show;
