// ==========================================
// 供应商报价引擎 - 命令行入口
// ==========================================
// 用法:
//   supplier-offer-engine import <file>...        导入报价文件（可多个）
//   supplier-offer-engine analyze <file>          按需求清单生成配货方案
//   supplier-offer-engine config [<key> <value>]  查看/更新配置
// 数据库: SUPPLIER_OFFER_DB_PATH > 用户数据目录 > ./supplier_offers.db
// 输出: stdout 为 JSON 结果，日志写入 stderr
// ==========================================

use serde::Serialize;
use supplier_offer_engine::api::{AnalysisApi, ConfigApi, ImportApi};
use supplier_offer_engine::{get_default_db_path, logging, APP_NAME, VERSION};

const USAGE: &str = "用法:
  supplier-offer-engine import <file>...
  supplier-offer-engine analyze <file>
  supplier-offer-engine config [<key> <value>]";

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn usage_error() -> ! {
    eprintln!("{}", USAGE);
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| usage_error());
    let rest: Vec<String> = args.collect();

    let db_path = get_default_db_path();
    tracing::info!(version = VERSION, db_path = %db_path, "{} 启动", APP_NAME);

    match command.as_str() {
        "import" => {
            if rest.is_empty() {
                usage_error();
            }
            let api = ImportApi::new(db_path);
            let mut responses = Vec::with_capacity(rest.len());
            let mut all_ok = true;
            for result in api.import_many(&rest).await {
                let response = result?;
                all_ok &= response.success;
                responses.push(response);
            }
            print_json(&responses)?;
            if !all_ok {
                std::process::exit(1);
            }
        }
        "analyze" => {
            let file = match rest.as_slice() {
                [file] => file,
                _ => usage_error(),
            };
            let api = AnalysisApi::new(db_path);
            let response = api.analyze_file(file).await?;
            print_json(&response)?;
        }
        "config" => {
            let api = ConfigApi::new(&db_path)?;
            match rest.as_slice() {
                [] => {}
                [key, value] => api.update_config(key, value)?,
                _ => usage_error(),
            }
            print_json(&api.get_engine_config().await?)?;
        }
        "--version" | "version" => println!("{} {}", APP_NAME, VERSION),
        _ => usage_error(),
    }

    Ok(())
}
