use anyhow::Result;
use meta_core::ErrorCode;

pub fn explain(code: &str) -> Result<()> {
    let code: ErrorCode = code.parse().map_err(anyhow::Error::msg)?;
    println!("{}", explanation(code));
    Ok(())
}

fn explanation(code: ErrorCode) -> String {
    format!("{code}: {}\n\n{}", code.title(), code.help())
}
