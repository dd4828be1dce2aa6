use feedauth::FeedAuth;
use miette::Result;

#[async_std::main]
async fn main() -> Result<()> {
    if !FeedAuth::load().await? {
        std::process::exit(1);
    }
    Ok(())
}
