//! Demo command
//!
//! Refreshes a small transactional application: a data source configured
//! through a placeholder, a JDBC template and transaction manager built on
//! it, a pair of collaborating beans and a payment service whose `pay`
//! method is transactional. The configuration enables both transaction
//! management and annotation-declared aspects, so the auto-proxy creator is
//! registered once and escalated.

use std::sync::Arc;

use anvil_context::ApplicationContext;
use anvil_core::{
    AnnotationAttributes, AttributeValue, Bean, BeanDefinition, BeanDefinitionRegistry,
    BootstrapConfig, BootstrapEvent, BootstrapObserver, ConfigurableBeanFactory, Error,
    MethodDescriptor, RecordingObserver, Result as BeanResult, TracingObserver,
    TypeDescriptor,
};
use anvil_tx::{
    transaction_manager_bean, EnableAspectJAutoProxy, EnableTransactionManagement,
    PlatformTransactionManager, TransactionAttribute, TransactionStatus, TransactionalProxy,
    AUTO_PROXY_CREATOR_BEAN_NAME, PLATFORM_TRANSACTION_MANAGER, TRANSACTIONAL,
};
use anyhow::{Context, Result};
use camino::Utf8Path;
use parking_lot::Mutex;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::DemoArgs;
use crate::commands::load_config;
use crate::output;

pub fn run(args: DemoArgs, path: Option<&Utf8Path>, overrides: &[(String, String)]) -> Result<()> {
    let config = load_config(path, overrides)?;
    let report = build_report(config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header("Post-processor invocations");
    let mut table = Table::new(&report.invocations);
    table.with(Style::sharp());
    println!("{}", table);

    output::header("Decorator chain");
    for (position, name) in report.decorators.iter().enumerate() {
        output::chain_entry(position + 1, name);
    }

    if !report.early_beans.is_empty() {
        output::header("Early beans");
        for name in &report.early_beans {
            output::warning(&format!("'{}' was created before every decorator was installed", name));
        }
    }

    output::header("Transactions");
    output::kv("Data source", &report.data_source_url);
    output::kv("Auto-proxy creator", &report.creator_kind);
    for entry in &report.transactions {
        output::journal_entry(entry);
    }

    output::success(&format!("Refreshed {} bean definitions", report.bean_count));
    Ok(())
}

/// Everything the demo observed during one refresh
#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub bean_count: usize,
    pub data_source_url: String,
    pub creator_kind: String,
    pub invocations: Vec<InvocationRow>,
    pub decorators: Vec<String>,
    pub early_beans: Vec<String>,
    pub transactions: Vec<String>,
    pub events: Vec<BootstrapEvent>,
}

#[derive(Debug, Tabled, Serialize)]
pub struct InvocationRow {
    phase: String,
    processor: String,
    tier: String,
}

/// Records events for the report while still logging them
#[derive(Default)]
struct DemoObserver {
    recording: RecordingObserver,
}

impl BootstrapObserver for DemoObserver {
    fn on_event(&self, event: &BootstrapEvent) {
        TracingObserver.on_event(event);
        self.recording.on_event(event);
    }
}

pub fn build_report(config: BootstrapConfig) -> Result<DemoReport> {
    let observer = Arc::new(DemoObserver::default());
    let journal = Arc::new(Mutex::new(Vec::new()));

    let ctx = ApplicationContext::new(config)?.with_observer(observer.clone());
    register_beans(&ctx, &journal)?;
    ctx.refresh().context("Failed to refresh the demo context")?;

    let data_source = ctx.get_bean_as::<DataSource>("dataSource")?;
    let pay_service = ctx
        .get_bean_as::<TransactionalProxy>("payService")
        .context("payService was not wrapped in a transactional proxy")?;

    pay_service.invoke("pay", |target| pay(target, 100))?;
    if let Err(e) = pay_service.invoke("pay", |target| pay(target, 0)) {
        journal.lock().push(format!("pay(0) failed: {}", e));
    }

    let creator_kind = ctx
        .factory()
        .bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME)?
        .property("kind")
        .unwrap_or("unknown")
        .to_string();
    let decorators = ctx.factory().decorator_chain().names();
    let bean_count = ctx.factory().bean_definition_count();
    ctx.close()?;

    let events = observer.recording.events();
    let invocations = events
        .iter()
        .filter_map(|event| match event {
            BootstrapEvent::PostProcessorInvoked { phase, name, tier } => Some(InvocationRow {
                phase: phase.to_string(),
                processor: name.clone(),
                tier: tier.map_or_else(|| "supplied".to_string(), |t| t.to_string()),
            }),
            _ => None,
        })
        .collect();
    let transactions = journal.lock().clone();

    Ok(DemoReport {
        bean_count,
        data_source_url: data_source.url.clone(),
        creator_kind,
        invocations,
        decorators,
        early_beans: observer.recording.early_beans(),
        transactions,
        events,
    })
}

fn pay(target: &Bean, amount: u32) -> BeanResult<u32> {
    target
        .downcast::<PayService>()
        .ok_or_else(|| Error::not_of_required_capability("payService", "PayService"))?
        .pay(amount)
}

fn register_beans(ctx: &ApplicationContext, journal: &Arc<Mutex<Vec<String>>>) -> Result<()> {
    let main_config = BeanDefinition::new("MainConfig").with_instance(|| Bean::new(MainConfig));
    let main_config = EnableAspectJAutoProxy::new()
        .apply(EnableTransactionManagement::new().apply(main_config));
    ctx.register("mainConfig", main_config)?;

    ctx.register(
        "dataSource",
        BeanDefinition::new("DataSource")
            .with_property("url", "${db.url:jdbc:h2:mem:anvil}")
            .with_supplier(|_, definition| {
                let url = definition.property("url").unwrap_or_default().to_string();
                Ok(Bean::new(DataSource { url }))
            }),
    )?;

    ctx.register(
        "jdbcTemplate",
        BeanDefinition::new("JdbcTemplate").with_supplier(|factory, _| {
            Ok(Bean::new(JdbcTemplate {
                data_source: data_source(factory)?,
            }))
        }),
    )?;

    let journal = journal.clone();
    ctx.register(
        "transactionManager",
        BeanDefinition::new("DataSourceTransactionManager")
            .implementing(PLATFORM_TRANSACTION_MANAGER)
            .with_supplier(move |factory, _| {
                let manager: Arc<dyn PlatformTransactionManager> = Arc::new(DataSourceTransactionManager {
                    data_source: data_source(factory)?,
                    journal: journal.clone(),
                });
                Ok(transaction_manager_bean(manager))
            }),
    )?;

    ctx.register(
        "instA",
        BeanDefinition::new("InstA")
            .depends_on("instB")
            .with_supplier(|factory, _| {
                let inst_b = factory
                    .get_bean("instB")?
                    .downcast::<InstB>()
                    .ok_or_else(|| Error::not_of_required_capability("instB", "InstB"))?;
                Ok(Bean::new(InstA { inst_b }))
            }),
    )?;
    ctx.register("instB", BeanDefinition::new("InstB").with_instance(|| Bean::new(InstB)))?;

    ctx.register(
        "payService",
        BeanDefinition::new("PayService").with_supplier(|factory, _| {
            let jdbc = factory
                .get_bean("jdbcTemplate")?
                .downcast::<JdbcTemplate>()
                .ok_or_else(|| Error::not_of_required_capability("jdbcTemplate", "JdbcTemplate"))?;
            Ok(Bean::new(PayService { jdbc }).with_descriptor(pay_service_descriptor()))
        }),
    )?;
    Ok(())
}

fn data_source(factory: &dyn ConfigurableBeanFactory) -> BeanResult<Arc<DataSource>> {
    factory
        .get_bean("dataSource")?
        .downcast::<DataSource>()
        .ok_or_else(|| Error::not_of_required_capability("dataSource", "DataSource"))
}

fn pay_service_descriptor() -> TypeDescriptor {
    TypeDescriptor::new("PayService")
        .with_method_descriptor(
            MethodDescriptor::new("PayService", "pay")
                .with_annotation(TRANSACTIONAL, AnnotationAttributes::new()),
        )
        .with_method_descriptor(MethodDescriptor::new("PayService", "balance").with_annotation(
            TRANSACTIONAL,
            AnnotationAttributes::new().with("readOnly", AttributeValue::Bool(true)),
        ))
}

struct MainConfig;

struct DataSource {
    url: String,
}

struct JdbcTemplate {
    data_source: Arc<DataSource>,
}

struct InstA {
    #[allow(dead_code)]
    inst_b: Arc<InstB>,
}

struct InstB;

struct PayService {
    jdbc: Arc<JdbcTemplate>,
}

impl PayService {
    fn pay(&self, amount: u32) -> BeanResult<u32> {
        if amount == 0 {
            return Err(Error::processor("PayService", "payment declined: zero amount"));
        }
        tracing::debug!(amount, url = %self.jdbc.data_source.url, "Recording payment");
        Ok(amount)
    }
}

/// Manager journaling transaction boundaries against its data source
struct DataSourceTransactionManager {
    data_source: Arc<DataSource>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl PlatformTransactionManager for DataSourceTransactionManager {
    fn begin(&self, attribute: &TransactionAttribute, name: &str) -> BeanResult<TransactionStatus> {
        self.journal
            .lock()
            .push(format!("begin {} [{}] on {}", name, attribute, self.data_source.url));
        Ok(TransactionStatus::new(name, attribute))
    }

    fn commit(&self, status: TransactionStatus) -> BeanResult<()> {
        self.journal.lock().push(format!("commit {}", status.name));
        Ok(())
    }

    fn rollback(&self, status: TransactionStatus) -> BeanResult<()> {
        self.journal.lock().push(format!("rollback {}", status.name));
        Ok(())
    }
}
