use log::{debug, error, info};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use trading_analysis::config_loader::{AnalysisConfig, ConfigFormat, ConfigLoader};
use trading_analysis::market_data::StaticMarketData;
use trading_analysis::model::{CandleInterval, OhlcvCandle};
use trading_analysis::repository::InMemoryOpportunityRepository;
use trading_analysis::service::MarketAnalysisService;

fn print_usage(program: &str) {
    println!("사용법: {} <캔들_JSON_파일> [심볼] [간격] [설정_파일_경로]", program);
    println!("지원되는 간격: 5m, 15m, 1h, 4h, 1d, 1w");
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    debug!("커맨드 라인 인수: {:?}", args);
    let program = args.first().map(String::as_str).unwrap_or("analyze_market");
    if args.len() < 2 {
        error!("인수가 충분하지 않습니다. 캔들 파일 경로가 필요합니다.");
        print_usage(program);
        return ExitCode::FAILURE;
    }

    let config = match args.get(4) {
        Some(path) => match ConfigLoader::load_from_file::<AnalysisConfig>(&PathBuf::from(path), ConfigFormat::Auto) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("설정 로드 실패: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => AnalysisConfig::default(),
    };

    let symbol = args.get(2).cloned().unwrap_or_else(|| config.default_symbol.clone());
    let interval_text = args.get(3).cloned().unwrap_or_else(|| config.default_interval.clone());
    let interval: CandleInterval = match interval_text.parse() {
        Ok(interval) => interval,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(program);
            return ExitCode::FAILURE;
        }
    };

    let candles_path = PathBuf::from(&args[1]);
    let candles: Vec<OhlcvCandle> = match tokio::fs::read_to_string(&candles_path).await {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(candles) => candles,
            Err(e) => {
                eprintln!("캔들 파일 파싱 실패 {}: {}", candles_path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            eprintln!("캔들 파일 읽기 실패 {}: {}", candles_path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    info!("{} {} 캔들 {}개 로드: {}", symbol, interval, candles.len(), candles_path.display());

    let limit = candles.len().min(config.max_limit);
    let source = StaticMarketData::new().with_series(&symbol, interval, candles);
    let service = MarketAnalysisService::new(source, Arc::new(InMemoryOpportunityRepository::new()), config);

    let (analysis, opportunities) = match service
        .analyze_with_opportunities(&symbol, interval.as_str(), limit, None, chrono::Utc::now())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            eprintln!("분석 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = serde_json::json!({
        "analysis": analysis,
        "opportunities": opportunities,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("결과 직렬화 실패: {}", e);
            ExitCode::FAILURE
        }
    }
}
