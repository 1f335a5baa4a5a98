use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream;
use futures::Sink;
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{DefaultServerParameterProvider, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldInfo, QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::data::DataRow;
use pgwire::messages::PgWireBackendMessage;
use pgwire::tokio::TlsAcceptor;
use tokio::net::TcpStream;
use tracing::debug;

use crate::auth::WallAuthSource;
use crate::engine::{Engine, EngineError};
use crate::model::*;
use crate::observability::{command_label, QUERIES_TOTAL, QUERY_DURATION_SECONDS};
use crate::sql::{self, Command, Placement, ResultKind, SqlError};

pub struct WallHandler {
    engine: Arc<Engine>,
    query_parser: Arc<WallQueryParser>,
}

impl WallHandler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            query_parser: Arc::new(WallQueryParser),
        }
    }

    async fn execute(&self, cmd: Command, format: &Format) -> PgWireResult<Response> {
        let label = command_label(&cmd);
        let start = Instant::now();
        let result = self.execute_command(cmd, format).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(QUERIES_TOTAL, "command" => label, "status" => status).increment(1);
        metrics::histogram!(QUERY_DURATION_SECONDS, "command" => label).record(start.elapsed().as_secs_f64());
        result
    }

    async fn execute_command(&self, cmd: Command, format: &Format) -> PgWireResult<Response> {
        let engine = &self.engine;
        match cmd {
            Command::InsertAd { placement, payload } => {
                let ad = match placement {
                    Placement::Auto { width, height } => engine.reserve_auto(width, height, payload).await,
                    Placement::At(rect) => engine.reserve_explicit(rect, payload).await,
                }
                .map_err(engine_err)?;
                ads_response(&[ad], format)
            }
            Command::UpdateAd { id, update } => {
                let ad = engine.update_ad(id, update).await.map_err(engine_err)?;
                ads_response(&[ad], format)
            }
            Command::DeleteAd { id } => match engine.soft_delete(id).await {
                Ok(()) => Ok(Response::Execution(Tag::new("DELETE").with_rows(1))),
                Err(EngineError::NotFound(_)) => Ok(Response::Execution(Tag::new("DELETE").with_rows(0))),
                Err(e) => Err(engine_err(e)),
            },
            Command::SelectAds { id: None } => ads_response(&engine.list_active().await, format),
            Command::SelectAds { id: Some(id) } => {
                let ad = engine
                    .get_ad(&id)
                    .await
                    .ok_or_else(|| engine_err(EngineError::NotFound(id)))?;
                ads_response(&[ad], format)
            }
            Command::SelectAvailability { rect } => {
                let availability = engine.check_availability(rect).await;
                let schema = Arc::new(schema(ResultKind::Availability, format));
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&availability.is_available())?;
                encoder.encode_field(&availability.reason().to_string())?;
                Ok(query_response(schema, vec![Ok(encoder.take_row())]))
            }
            Command::SelectPosition { width, height } => {
                let schema = Arc::new(schema(ResultKind::Position, format));
                let mut rows = Vec::new();
                if let Some(pos) = engine.find_position(width, height).await {
                    let mut encoder = DataRowEncoder::new(schema.clone());
                    encoder.encode_field(&pos.x)?;
                    encoder.encode_field(&pos.y)?;
                    rows.push(Ok(encoder.take_row()));
                }
                Ok(query_response(schema, rows))
            }
            Command::SelectStats => {
                let stats = engine.stats().await;
                let schema = Arc::new(schema(ResultKind::Stats, format));
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&stats.total_pixels)?;
                encoder.encode_field(&stats.occupied_pixels)?;
                encoder.encode_field(&stats.available_pixels)?;
                encoder.encode_field(&stats.total_ads)?;
                encoder.encode_field(&stats.total_revenue)?;
                Ok(query_response(schema, vec![Ok(encoder.take_row())]))
            }
        }
    }
}

fn query_response(schema: Arc<Vec<FieldInfo>>, rows: Vec<PgWireResult<DataRow>>) -> Response {
    Response::Query(QueryResponse::new(schema, stream::iter(rows)))
}

fn ads_response(ads: &[Ad], format: &Format) -> PgWireResult<Response> {
    let schema = Arc::new(schema(ResultKind::Ads, format));
    let rows = ads.iter().map(|ad| ad_row(&schema, ad)).collect();
    Ok(query_response(schema, rows))
}

fn ad_row(schema: &Arc<Vec<FieldInfo>>, ad: &Ad) -> PgWireResult<DataRow> {
    let mut encoder = DataRowEncoder::new(schema.clone());
    encoder.encode_field(&ad.id.to_string())?;
    encoder.encode_field(&ad.rect.x)?;
    encoder.encode_field(&ad.rect.y)?;
    encoder.encode_field(&ad.rect.width)?;
    encoder.encode_field(&ad.rect.height)?;
    encoder.encode_field(&ad.status.to_string())?;
    encoder.encode_field(&ad.price)?;
    encoder.encode_field(&ad.business_name)?;
    encoder.encode_field(&ad.description)?;
    encoder.encode_field(&ad.image_url)?;
    encoder.encode_field(&ad.target_url)?;
    encoder.encode_field(&ad.alt)?;
    encoder.encode_field(&ad.created_at)?;
    encoder.encode_field(&ad.updated_at)?;
    Ok(encoder.take_row())
}

const AD_COLUMNS: &[(&str, Type)] = &[
    ("id", Type::VARCHAR),
    ("x", Type::INT4),
    ("y", Type::INT4),
    ("width", Type::INT4),
    ("height", Type::INT4),
    ("status", Type::VARCHAR),
    ("price", Type::INT8),
    ("business_name", Type::VARCHAR),
    ("description", Type::VARCHAR),
    ("image_url", Type::VARCHAR),
    ("target_url", Type::VARCHAR),
    ("alt", Type::VARCHAR),
    ("created_at", Type::INT8),
    ("updated_at", Type::INT8),
];

const AVAILABILITY_COLUMNS: &[(&str, Type)] = &[("available", Type::BOOL), ("reason", Type::VARCHAR)];

const POSITION_COLUMNS: &[(&str, Type)] = &[("x", Type::INT4), ("y", Type::INT4)];

const STATS_COLUMNS: &[(&str, Type)] = &[
    ("total_pixels", Type::INT8),
    ("occupied_pixels", Type::INT8),
    ("available_pixels", Type::INT8),
    ("total_ads", Type::INT8),
    ("total_revenue", Type::INT8),
];

fn columns(kind: ResultKind) -> &'static [(&'static str, Type)] {
    match kind {
        ResultKind::Ads => AD_COLUMNS,
        ResultKind::Availability => AVAILABILITY_COLUMNS,
        ResultKind::Position => POSITION_COLUMNS,
        ResultKind::Stats => STATS_COLUMNS,
        ResultKind::None => &[],
    }
}

/// Row description for `kind`, each column in the format the client asked for.
fn schema(kind: ResultKind, format: &Format) -> Vec<FieldInfo> {
    columns(kind)
        .iter()
        .enumerate()
        .map(|(i, (name, ty))| FieldInfo::new((*name).into(), None, None, ty.clone(), format.format_for(i)))
        .collect()
}

#[async_trait]
impl SimpleQueryHandler for WallHandler {
    async fn do_query<C>(&self, _client: &mut C, query: &str) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        debug!("simple query: {query}");
        let cmd = sql::parse_sql(query, &[]).map_err(sql_err)?;
        Ok(vec![self.execute(cmd, &Format::UnifiedText).await?])
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct WallQueryParser;

#[async_trait]
impl QueryParser for WallQueryParser {
    type Statement = String;

    async fn parse_sql<C>(&self, _client: &C, sql: &str, _types: &[Option<Type>]) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(&self, stmt: &String, column_format: Option<&Format>) -> PgWireResult<Vec<FieldInfo>> {
        Ok(schema(sql::result_kind(stmt), column_format.unwrap_or(&Format::UnifiedText)))
    }
}

#[async_trait]
impl ExtendedQueryHandler for WallHandler {
    type Statement = String;
    type QueryParser = WallQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        _client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let params: Vec<Option<String>> = portal
            .parameters
            .iter()
            .map(|p| p.as_ref().map(|bytes| String::from_utf8_lossy(bytes).into_owned()))
            .collect();
        let cmd = sql::parse_sql(&portal.statement.statement, &params).map_err(sql_err)?;
        self.execute(cmd, &portal.result_column_format).await
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        let fields = schema(sql::result_kind(&target.statement), &Format::UnifiedText);
        Ok(DescribeStatementResponse::new(param_types, fields))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let kind = sql::result_kind(&target.statement.statement);
        Ok(DescribePortalResponse::new(schema(kind, &target.result_column_format)))
    }
}

/// Highest `$N` placeholder in the SQL string.
fn count_params(sql: &str) -> usize {
    let mut max = 0usize;
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if let Ok(n) = rest[..digits].parse::<usize>() {
            max = max.max(n);
        }
        rest = &rest[digits..];
    }
    max
}

// ── Factory ──────────────────────────────────────────────────────

pub struct WallFactory {
    handler: Arc<WallHandler>,
    auth_handler: Arc<CleartextPasswordAuthStartupHandler<WallAuthSource, DefaultServerParameterProvider>>,
    noop: Arc<NoopHandler>,
}

impl WallFactory {
    pub fn new(engine: Arc<Engine>, user: String, password: String) -> Self {
        let auth_source = WallAuthSource::new(user, password);
        let param_provider = DefaultServerParameterProvider::default();
        Self {
            handler: Arc::new(WallHandler::new(engine)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(auth_source, param_provider)),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for WallFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Serve one client connection until it closes.
pub async fn process_connection(
    socket: TcpStream,
    factory: Arc<WallFactory>,
    tls: Option<TlsAcceptor>,
) -> io::Result<()> {
    pgwire::tokio::process_socket(socket, tls, factory).await
}

fn engine_err(e: EngineError) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        e.sqlstate().into(),
        e.to_string(),
    )))
}

fn sql_err(e: SqlError) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "42601".into(),
        e.to_string(),
    )))
}
