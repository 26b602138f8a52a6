//! Performance benchmarks for the payroll engine.
//!
//! - Single payslip computation
//! - Gross-from-net search
//! - Payroll run of 100 and 500 employees on an in-memory store
//! - Journal generation for a 500-employee period
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use paie_engine::accounting::generate_journal;
use paie_engine::calculation::{PayslipInput, compute_payslip, gross_from_net};
use paie_engine::config::ConfigLoader;
use paie_engine::models::{Employee, GeneralSettings, Motif, Period};
use paie_engine::payroll::{PayrollRunRequest, run_payroll};
use paie_engine::store::{PayrollStore, employees, settings};

fn config() -> ConfigLoader {
    ConfigLoader::load("./config/default").expect("Failed to load config")
}

fn period() -> Period {
    "2026-03".parse().unwrap()
}

fn employee(id: i64) -> Employee {
    Employee {
        id,
        matricule: format!("M{:05}", id),
        full_name: format!("Salarie {}", id),
        national_id: None,
        cnss_number: Some(format!("CNSS-{}", id)),
        cnam_number: Some(format!("CNAM-{}", id)),
        hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        termination_date: None,
        base_salary: Decimal::from(8_000 + (id % 50) * 1_000),
        bank_code: (id % 3 != 0).then(|| "BMCI".to_string()),
        bank_account: (id % 3 != 0).then(|| format!("ACC{:06}", id)),
        subject_to_cnss: true,
        subject_to_cnam: true,
        subject_to_its: true,
    }
}

fn normal_motif(config: &ConfigLoader) -> Motif {
    let mut motif = Motif::from(&config.config().motifs()[0]);
    motif.id = 1;
    motif
}

/// A store with `count` employees and the motifs seeded.
fn populated_store(config: &ConfigLoader, count: i64) -> PayrollStore {
    let store = PayrollStore::open_in_memory().unwrap();
    for definition in config.config().motifs() {
        employees::upsert_motif(store.connection(), &Motif::from(definition)).unwrap();
    }
    settings::init_settings(
        store.connection(),
        &GeneralSettings {
            current_period: period(),
            license_expiry: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
        },
    )
    .unwrap();
    for id in 1..=count {
        employees::insert_employee(store.connection(), &employee(id)).unwrap();
    }
    store
}

fn run_request(count: i64) -> PayrollRunRequest {
    PayrollRunRequest {
        period: period(),
        motif_code: "NORMAL".to_string(),
        employee_ids: (1..=count).collect(),
        variable_lines: Default::default(),
    }
}

fn bench_single_payslip(c: &mut Criterion) {
    let config = config();
    let motif = normal_motif(&config);
    let employee = employee(7);

    c.bench_function("single_payslip", |b| {
        b.iter(|| {
            let result = compute_payslip(
                PayslipInput {
                    employee: &employee,
                    motif: &motif,
                    period: period(),
                    worked_days: Decimal::from(30),
                    variable_lines: &[],
                    installments: &[],
                    cnss_base_used: Decimal::ZERO,
                },
                &config,
            )
            .unwrap();
            black_box(result)
        })
    });
}

fn bench_gross_from_net(c: &mut Criterion) {
    let config = config();
    let motif = normal_motif(&config);
    let employee = employee(7);

    c.bench_function("gross_from_net", |b| {
        b.iter(|| {
            let result =
                gross_from_net(Decimal::from(41_234), &employee, &motif, period(), &config).unwrap();
            black_box(result)
        })
    });
}

fn bench_payroll_run(c: &mut Criterion) {
    let config = config();
    let mut group = c.benchmark_group("payroll_run");
    group.sample_size(20);

    for count in [100i64, 500] {
        let request = run_request(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut store = populated_store(&config, count);
            b.iter(|| {
                let report =
                    run_payroll(&mut store, &config, &request, &CancellationToken::new(), |_| {})
                        .unwrap();
                black_box(report)
            })
        });
    }
    group.finish();
}

fn bench_journal(c: &mut Criterion) {
    let config = config();
    let mut store = populated_store(&config, 500);
    run_payroll(
        &mut store,
        &config,
        &run_request(500),
        &CancellationToken::new(),
        |_| {},
    )
    .unwrap();

    c.bench_function("journal_500_payslips", |b| {
        b.iter(|| black_box(generate_journal(&mut store, &config, period()).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_single_payslip,
    bench_gross_from_net,
    bench_payroll_run,
    bench_journal,
);
criterion_main!(benches);
