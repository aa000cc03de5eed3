use model2data_core::ParsedSchema;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(ParsedSchema);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to render json schema: {err}"),
    }
}
