mod entry;

use reqtrace::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
