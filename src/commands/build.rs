use crate::{BuildArgs, build::Builder};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    // The project root is always the working directory
    let root = std::env::current_dir()?;

    let builder = Builder::new(root, args.options());
    builder.build().await?;

    Ok(())
}
