use answer_backend::types::Result;

#[tokio::main]
async fn main() -> Result<()> {
    answer_backend::start().await
}
