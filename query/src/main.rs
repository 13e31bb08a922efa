use mol_search::catalog::Catalog;
use mol_search::chem::BuiltinToolkit;
use mol_search::dispatch::{Dispatcher, FunctionRegistry, FunctionSpec, Value, ValueType};
use mol_search::error::Error;
use mol_search::index::Index;
use mol_search::load;

use std::sync::Arc;
use std::time::Instant;

use log::info;

use clap::Parser;
#[derive(Parser, Debug)] #[command(author, version, about, long_about = None)]
struct Args {

    //Tab-separated compound file
    #[arg(short, long)]
    file: String,

    //Function to call, e.g. SimilaritySearch
    function: String,

    //Input bindings as predicate=value, e.g. smiles=c1ccccc1 limit=5
    bindings: Vec<String>,
}

///Splits `predicate=value` and reads the value as the declared input type
fn parse_binding(spec: &FunctionSpec, binding: &str) -> Result<(String, Value), Error> {

    let (predicate, text) = binding
        .split_once('=')
        .ok_or_else(|| Error::InvalidArgument(format!("expected predicate=value, got {:?}", binding)))?;

    let value_type = spec
        .input(mol_search::dispatch::schema::local_name(predicate))
        .map(|input| input.value_type)
        .unwrap_or(ValueType::String);

    return Ok((predicate.to_string(), Value::parse_as(text, value_type)?));
}

pub fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {

    env_logger::init();

    let args = Args::parse();

    let registry = Arc::new(FunctionRegistry::standard());
    let spec = registry
        .get(&args.function)
        .ok_or_else(|| Error::UnknownFunction(args.function.clone()))?;

    let bindings = args.bindings
        .iter()
        .map(|b| parse_binding(spec, b))
        .collect::<Result<Vec<_>, _>>()?;

    let compounds = load::load_compounds(&args.file)?;
    let index = Index::ingest(compounds, Arc::new(BuiltinToolkit))?;

    let dispatcher = Dispatcher::new(Arc::new(index), Arc::new(Catalog::standard()), Arc::clone(&registry));

    let start = Instant::now();
    let rows = dispatcher.invoke(&args.function, &bindings)?;

    println!("{}", rows.columns().join("\t"));
    let mut count = 0;
    for row in rows {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", fields.join("\t"));
        count += 1;
    }

    info!("{}: {} rows in {:.3}s", args.function, count, start.elapsed().as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn bindings_use_declared_types() {

        let registry = FunctionRegistry::standard();
        let spec = registry.get("SimilaritySearch").unwrap();

        assert_eq!(parse_binding(spec, "limit=5").unwrap(), ("limit".to_string(), Value::Int(5)));
        assert_eq!(parse_binding(spec, "minScore=0.25").unwrap().1, Value::Float(0.25));
        assert_eq!(parse_binding(spec, "smiles=C(=O)O").unwrap().1, Value::Str("C(=O)O".to_string()));
        assert_eq!(parse_binding(spec, "useChirality=true").unwrap().1, Value::Bool(true));
        assert!(parse_binding(spec, "limit").is_err());
        assert!(parse_binding(spec, "limit=many").is_err());
    }
}
