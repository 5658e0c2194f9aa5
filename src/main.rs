use load_test::error::AppResult;

fn main() -> AppResult<()> {
    load_test::entry::run()
}
