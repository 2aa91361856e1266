use anyhow::Context;
use investwise_core::momentum;

struct SampleSecurity {
    symbol: &'static str,
    name: &'static str,
    sector: &'static str,
    current_price: f64,
    pe_ratio: f64,
    beta: f64,
    dividend_yield: f64,
    debt_to_equity: f64,
    profit_margin: f64,
    risk_bucket: &'static str,
    change_1d: f64,
    change_1w: f64,
    change_1m: f64,
}

// A small NSE universe so the selection endpoints have something to screen
// before the first AI sync runs. Change values are chosen to exercise all
// three momentum labels.
const SAMPLE_SECURITIES: &[SampleSecurity] = &[
    SampleSecurity {
        symbol: "RELIANCE",
        name: "Reliance Industries Ltd",
        sector: "Energy",
        current_price: 2915.5,
        pe_ratio: 25.3,
        beta: 1.1,
        dividend_yield: 0.32,
        debt_to_equity: 0.6,
        profit_margin: 8.5,
        risk_bucket: "medium",
        change_1d: 0.8,
        change_1w: 2.4,
        change_1m: 9.5,
    },
    SampleSecurity {
        symbol: "TCS",
        name: "Tata Consultancy Services Ltd",
        sector: "IT",
        current_price: 3845.1,
        pe_ratio: 30.2,
        beta: 0.9,
        dividend_yield: 1.5,
        debt_to_equity: 0.1,
        profit_margin: 22.0,
        risk_bucket: "low",
        change_1d: -0.3,
        change_1w: 0.2,
        change_1m: 4.0,
    },
    SampleSecurity {
        symbol: "HDFCBANK",
        name: "HDFC Bank Ltd",
        sector: "Banking",
        current_price: 1520.75,
        pe_ratio: 20.1,
        beta: 1.0,
        dividend_yield: 1.2,
        debt_to_equity: 0.5,
        profit_margin: 18.0,
        risk_bucket: "low",
        change_1d: -1.2,
        change_1w: -3.5,
        change_1m: -10.2,
    },
    SampleSecurity {
        symbol: "ADANIPORTS",
        name: "Adani Ports and Special Economic Zone Ltd",
        sector: "Infrastructure",
        current_price: 1350.0,
        pe_ratio: 28.7,
        beta: 1.3,
        dividend_yield: 0.6,
        debt_to_equity: 1.0,
        profit_margin: 14.0,
        risk_bucket: "high",
        change_1d: 1.1,
        change_1w: 4.2,
        change_1m: 12.3,
    },
];

pub async fn seed_sample_securities(pool: &sqlx::PgPool) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let mut upserted: u64 = 0;
    for s in SAMPLE_SECURITIES {
        let label = momentum::from_changes(Some(s.change_1m), Some(s.change_1w));

        let res = sqlx::query(
            "INSERT INTO securities \
               (symbol, name, exchange, sector, current_price, pe_ratio, beta, \
                dividend_yield, debt_to_equity, profit_margin, risk_bucket, \
                change_1d, change_1w, change_1m, momentum, last_updated) \
             VALUES ($1, $2, 'NSE', $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, now()) \
             ON CONFLICT (symbol) DO UPDATE SET \
               name = EXCLUDED.name, \
               sector = EXCLUDED.sector, \
               current_price = EXCLUDED.current_price, \
               pe_ratio = EXCLUDED.pe_ratio, \
               beta = EXCLUDED.beta, \
               dividend_yield = EXCLUDED.dividend_yield, \
               debt_to_equity = EXCLUDED.debt_to_equity, \
               profit_margin = EXCLUDED.profit_margin, \
               risk_bucket = EXCLUDED.risk_bucket, \
               change_1d = EXCLUDED.change_1d, \
               change_1w = EXCLUDED.change_1w, \
               change_1m = EXCLUDED.change_1m, \
               momentum = EXCLUDED.momentum, \
               last_updated = now()",
        )
        .persistent(false)
        .bind(s.symbol)
        .bind(s.name)
        .bind(s.sector)
        .bind(s.current_price)
        .bind(s.pe_ratio)
        .bind(s.beta)
        .bind(s.dividend_yield)
        .bind(s.debt_to_equity)
        .bind(s.profit_margin)
        .bind(s.risk_bucket)
        .bind(s.change_1d)
        .bind(s.change_1w)
        .bind(s.change_1m)
        .bind(label.as_str())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("upsert sample security {} failed", s.symbol))?;

        upserted += res.rows_affected();
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(upserted)
}
