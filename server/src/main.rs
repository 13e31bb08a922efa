use mol_search::catalog::Catalog;
use mol_search::chem::BuiltinToolkit;
use mol_search::config::ServiceConfig;
use mol_search::dispatch::{Dispatcher, FunctionRegistry, Rows, Value};
use mol_search::error::Error;
use mol_search::index::Index;
use mol_search::load;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, StatusCode};
use hyper::server::Server;
use log::{error, info, warn};
use serde_json::json;

use clap::Parser;
#[derive(Parser, Debug)] #[command(author, version, about, long_about = None)]
struct Args {

    //Tab-separated compound file with ?chem, ?smiles and optional ?db columns
    #[arg(short, long)]
    file: Option<String>,

    //YAML service config
    #[arg(short, long)]
    config: Option<String>,

    //Port to listen on, overrides the config
    #[arg(short, long)]
    port: Option<u16>,

    //Address to bind, overrides the config
    #[arg(long)]
    host: Option<String>,
}

fn respond(status: StatusCode, body: serde_json::Value) -> Response<Body> {

    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(hyper::header::CONTENT_TYPE, hyper::header::HeaderValue::from_static("application/json"));

    return response;
}

fn error_response(e: &Error) -> Response<Body> {

    let status = match e.is_caller_error() {
        true => StatusCode::BAD_REQUEST,
        false => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if !e.is_caller_error() {
        error!("request failed: {}", e);
    }

    return respond(status, json!({"error": e.to_string()}));
}

///SPARQL JSON results body for one call
fn sparql_results(rows: Rows) -> serde_json::Value {

    let vars: Vec<String> = rows.columns().iter().map(|c| c.to_string()).collect();

    let bindings: Vec<serde_json::Value> = rows
        .map(|row| {
            let mut binding = serde_json::Map::new();
            for (var, value) in vars.iter().zip(row.iter()) {
                binding.insert(var.clone(), value.to_sparql_json());
            }
            serde_json::Value::Object(binding)
        })
        .collect();

    return json!({"head": {"vars": vars}, "results": {"bindings": bindings}});
}

///Body is `{"function": name, "bindings": {predicate: value}}`
fn parse_call(body: &Bytes) -> Result<(String, Vec<(String, Value)>), Error> {

    let parsed: serde_json::Value = serde_json::from_slice(body)?;

    let function = parsed.get("function")
        .and_then(|f| f.as_str())
        .ok_or_else(|| Error::InvalidArgument("request needs a \"function\" string".to_string()))?
        .to_string();

    let mut bindings = Vec::new();
    match parsed.get("bindings") {
        None | Some(serde_json::Value::Null) => {},
        Some(serde_json::Value::Object(map)) => {
            for (predicate, value) in map {
                bindings.push((predicate.clone(), Value::from_json(predicate, value)?));
            }
        },
        Some(_) => return Err(Error::InvalidArgument("\"bindings\" must be an object".to_string())),
    }

    return Ok((function, bindings));
}

async fn call_function(req: Request<Body>, dispatcher: &Dispatcher) -> Response<Body> {

    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(body) => body,
        Err(e) => return respond(StatusCode::BAD_REQUEST, json!({"error": e.to_string()})),
    };

    let (function, bindings) = match parse_call(&body) {
        Ok(call) => call,
        Err(e) => return error_response(&e),
    };

    return match dispatcher.invoke(&function, &bindings) {
        Ok(rows) => respond(StatusCode::OK, sparql_results(rows)),
        Err(e) => {
            info!("{} rejected: {}", function, e);
            error_response(&e)
        },
    };
}

fn list_functions(dispatcher: &Dispatcher) -> Response<Body> {

    return match serde_json::to_value(dispatcher.registry().functions()) {
        Ok(functions) => respond(StatusCode::OK, json!({"functions": functions})),
        Err(e) => error_response(&Error::from(e)),
    };
}

///Full catalog entries, including explainability level and limitations
fn list_fingerprints(dispatcher: &Dispatcher) -> Response<Body> {

    return match serde_json::to_value(dispatcher.catalog().entries()) {
        Ok(fingerprints) => respond(StatusCode::OK, json!({"fingerprints": fingerprints})),
        Err(e) => error_response(&Error::from(e)),
    };
}

async fn handle(req: Request<Body>, dispatcher: Arc<Dispatcher>) -> Result<Response<Body>, Infallible> {

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/function") => call_function(req, &dispatcher).await,
        (&Method::GET, "/functions") => list_functions(&dispatcher),
        (&Method::GET, "/fingerprints") => list_fingerprints(&dispatcher),
        _ => respond(StatusCode::NOT_FOUND, json!({"error": format!("no route for {}", path)})),
    };

    return Ok(response);
}

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {

    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(filename) => ServiceConfig::from_file(filename)?,
        None => ServiceConfig::default(),
    };
    if let Some(file) = args.file {
        config.compounds_file = Some(file);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    let compounds_file = config.compounds_file
        .clone()
        .ok_or("no compound file given (use --file or compounds_file in the config)")?;

    let compounds = load::load_compounds(&compounds_file)?;
    let index = Index::ingest(compounds, Arc::new(BuiltinToolkit))?;

    if config.warm_structures {
        let report = index.warm(config.warm_types());
        if report.failures > 0 {
            warn!("{} of {} compounds have unparsable structures", report.failures, index.len());
        }
    }

    let types: Vec<&str> = config.warm_types().iter().map(|t| t.key()).collect();
    info!("fingerprints ready: {:?}", types);

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(index),
        Arc::new(Catalog::standard()),
        Arc::new(FunctionRegistry::standard()),
    ));

    // For every connection, we must make a `Service` to handle all
    // incoming HTTP requests on said connection.
    let make_svc = make_service_fn(move |_conn| {
        let dispatcher = dispatcher.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| {
            let dispatcher = dispatcher.clone();
            handle(req, dispatcher)
        }))}
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let server = Server::bind(&addr).serve(make_svc);

    info!("Listening on http://{}", addr);

    server.await?;

    Ok(())
}

#[cfg(test)]
mod test {

    use super::*;
    use mol_search::compound::Compound;

    fn dispatcher() -> Arc<Dispatcher> {

        let records = vec![
            Compound::new("http://example.org/c1", "c1ccccc1", None),
            Compound::new("http://example.org/c2", "CCO", None),
        ];
        let index = Index::ingest(records, Arc::new(BuiltinToolkit)).unwrap();

        return Arc::new(Dispatcher::new(Arc::new(index), Arc::new(Catalog::standard()), Arc::new(FunctionRegistry::standard())));
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Body> {

        return Request::builder()
            .method(method)
            .uri(path)
            .body(Body::from(body.to_string()))
            .unwrap();
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        return serde_json::from_slice(&bytes).unwrap();
    }

    #[tokio::test]
    async fn similarity_call_returns_sparql_json() {

        let body = r#"{"function": "SimilaritySearch", "bindings": {"smiles": "c1ccccc1", "limit": 1}}"#;
        let response = handle(request(Method::POST, "/function", body), dispatcher()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        dbg!(&json);
        assert_eq!(json["head"]["vars"], json!(["result", "score"]));
        let binding = &json["results"]["bindings"][0];
        assert_eq!(binding["result"]["type"], "uri");
        assert_eq!(binding["result"]["value"], "http://example.org/c1");
        assert_eq!(binding["score"]["value"], "1");
    }

    #[tokio::test]
    async fn caller_errors_are_400() {

        let body = r#"{"function": "SimilaritySearch", "bindings": {"smiles": "c1ccccc1", "limit": 0}}"#;
        let response = handle(request(Method::POST, "/function", body), dispatcher()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = handle(request(Method::POST, "/function", "not json"), dispatcher()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = r#"{"function": "Teleport"}"#;
        let response = handle(request(Method::POST, "/function", body), dispatcher()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn routes() {

        let response = handle(request(Method::GET, "/functions", ""), dispatcher()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["functions"].as_array().unwrap().len(), 3);

        let response = handle(request(Method::GET, "/fingerprints", ""), dispatcher()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let fingerprints = json["fingerprints"].as_array().unwrap();
        assert_eq!(fingerprints.len(), 7);
        assert_eq!(fingerprints[0]["key"], "morgan_ecfp");
        assert_eq!(fingerprints[0]["fp_type"], "morgan_ecfp");
        assert!(fingerprints.iter().all(|f| f["level"].is_string() && f["limitations"].is_string()));
        assert!(fingerprints.iter().all(|f| f["typical_explanations"].as_array().map_or(false, |e| !e.is_empty())));

        let response = handle(request(Method::GET, "/sparql", ""), dispatcher()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
