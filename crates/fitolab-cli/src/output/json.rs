use fitolab_core::error::FitolabError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), FitolabError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
