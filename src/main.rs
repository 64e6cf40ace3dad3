use wrkr::error::AppResult;

fn main() -> AppResult<()> {
    wrkr::entry::run()
}
