use clap::Parser;
use fortune_ai_common::{expand_selection, manual_question, PromptOptions, QuestionRecord};
use fortune_ai_rust::{ai_provider, auth, cli, config, error, export, llm, pipeline, runner, scanner};
use ai_provider::AiProvider;
use cli::{Cli, Commands, KeywordSource, RunArgs};
use config::Config;
use error::{FortuneAiError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use llm::{Backend, GeminiClient, TokenUsage, VertexClient};
use runner::RunSettings;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Run(args) => run(args, config, cli.verbose).await?,

        Commands::Keywords { source, category } => {
            let store = load_store(&source)?;

            match category {
                Some(name) => {
                    let table = store
                        .get(&name)
                        .ok_or_else(|| FortuneAiError::InvalidSelection(format!("カテゴリ「{}」がありません", name)))?;
                    println!("{} ({}件)", table.category(), table.len());
                    for record in table.records() {
                        println!("  - {}", record.name);
                        for (column, value) in table.attributes(&record.name) {
                            println!("      {}: {}", column, value);
                        }
                    }
                }
                None => {
                    println!("カテゴリ:");
                    for table in store.tables() {
                        println!("  {} ({}件)", table.category(), table.len());
                    }
                }
            }
        }

        Commands::Combos { source, slots } => {
            let store = load_store(&source)?;
            let selection = pipeline::build_selection(slots)?;
            fortune_ai_common::validate_selection(&selection, &store)
                .map_err(|report| FortuneAiError::InvalidSelection(report.to_string()))?;

            let combinations = expand_selection(&selection, &store);
            for (index, combination) in combinations.iter().enumerate() {
                println!("{:>4}. {}", index + 1, combination.label());
            }
            println!("\n組み合わせ数: {}", combinations.len());
        }

        Commands::Config { set_api_key, set_project, set_location, set_model, use_vertex, show } => {
            // 保存はファイルの値だけを対象にする（環境変数の値を書き込まない）
            let mut file_config = Config::load_from(&Config::config_path()?)?;
            let mut changed = false;

            if let Some(key) = set_api_key {
                file_config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }
            if let Some(project) = set_project {
                file_config.vertex_project = Some(project);
                changed = true;
                println!("✔ Vertex AIプロジェクトを設定しました");
            }
            if let Some(location) = set_location {
                file_config.vertex_location = location;
                changed = true;
                println!("✔ Vertex AIリージョンを設定しました");
            }
            if let Some(model) = set_model {
                file_config.model = model;
                changed = true;
                println!("✔ モデルを設定しました");
            }
            if let Some(flag) = use_vertex {
                file_config.use_vertex_ai = flag;
                changed = true;
                println!("✔ Vertex AI既定: {}", flag);
            }
            if changed {
                file_config.save()?;
            }

            if show {
                println!("設定: {}", Config::config_path()?.display());
                println!("  モデル: {}", config.model);
                println!("  APIキー: {}", config.masked_api_key());
                println!("  Vertex AI既定: {}", config.use_vertex_ai);
                println!("  Vertex AIプロジェクト: {}", config.vertex_project.as_deref().unwrap_or("未設定"));
                println!("  Vertex AIリージョン: {}", config.vertex_location);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  思考予算: {}", config.thinking_budget);
                println!("  システムプロンプト: {}", if config.default_system_prompt.is_some() { "設定済み" } else { "未設定" });
                println!("  ログイン: {}", if auth::is_required(&config.auth) { "有効" } else { "無効" });
            }
        }
    }

    Ok(())
}

async fn run(args: RunArgs, config: Config, verbose: bool) -> Result<()> {
    println!("🔮 fortune-ai - 占い文章生成\n");

    if !args.dry_run {
        auth::authenticate(&config.auth, args.user.as_deref(), args.password.as_deref())?;
    }

    // 1. キーワード表
    println!("[1/4] キーワード表を読み込み中...");
    let store = load_store(&args.source)?;
    println!("✔ {}カテゴリを読み込み ({})\n", store.len(), store.categories().join(", "));

    // 2. 質問
    println!("[2/4] 質問を読み込み中...");
    let questions = load_questions(&args)?;
    println!("✔ {}件の質問\n", questions.len());

    // 3. 検証・計画
    println!("[3/4] キーワード指定を検証中...");
    let batch = pipeline::prepare_batch(&store, args.slots.clone(), &questions)?;
    let overridden = batch.override_count();
    if overridden > 0 {
        println!("  質問ごとのキーワード指定: {}件", overridden);
    }
    println!("✔ {}\n", batch.summary_line(&questions));

    if batch.plan.is_empty() {
        println!("生成対象の組み合わせがありません");
        return Ok(());
    }

    let system_prompt = args
        .system_prompt
        .clone()
        .or_else(|| config.default_system_prompt.clone())
        .filter(|p| !p.trim().is_empty())
        .ok_or(FortuneAiError::MissingSystemPrompt)?;

    let settings = RunSettings {
        prompt: PromptOptions {
            system_prompt,
            rules: pipeline::read_optional_text(args.rules.clone(), args.rules_file.as_deref())?,
            tone: pipeline::read_optional_text(args.tone.clone(), args.tone_file.as_deref())?,
            answer_length: args.answer_length,
            summary_length: args.summary_length,
        },
        sequential: args.sequential,
        limit: args.limit,
    };

    let calls = batch.plan.calls(settings.sequential);
    if args.dry_run {
        println!("ドライラン: API呼び出し {}回", calls.len());
        for (index, call) in calls.iter().enumerate() {
            println!("  {:>4}. {}", index + 1, call.label());
            if verbose {
                println!("{}\n", call.prompt(&store, &settings.prompt));
            }
        }
        return Ok(());
    }

    // 4. 生成
    let model = args.model.clone().unwrap_or_else(|| config.model.clone());
    let provider = AiProvider::resolve(args.provider, &config, &model);
    let thinking_budget = args.thinking_budget.unwrap_or(config.thinking_budget);
    let timeout = Duration::from_secs(args.timeout.unwrap_or(config.timeout_seconds));
    let backend = match provider {
        AiProvider::Gemini => Backend::Gemini(GeminiClient::new(config.get_api_key()?, &model, thinking_budget, timeout)?),
        AiProvider::Vertex => Backend::Vertex(VertexClient::new(
            config.get_vertex_project()?,
            config.vertex_location.clone(),
            &model,
            thinking_budget,
            timeout,
        )
        .await?),
    };

    println!("[4/4] 生成中... ({} / {})", provider, model);
    let progress = ProgressBar::new(calls.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
        progress.set_style(style.progress_chars("=>-"));
    }

    let outcome = runner::run_batch(&backend, &batch.plan, &store, &settings, &progress).await;
    println!("✔ 生成完了 ({}件, 失敗 {}件)\n", outcome.table.len(), outcome.failures);
    print_usage(&outcome.usage);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    export::export_results(&outcome.table, &args.format, &args.output, &args.name, &timestamp)?;

    println!("\n✅ 完了");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_store(source: &KeywordSource) -> Result<fortune_ai_common::KeywordStore> {
    scanner::load_keyword_store(source.keywords_dir.as_deref(), &source.keyword_files)
}

fn load_questions(args: &RunArgs) -> Result<Vec<QuestionRecord>> {
    if let Some(path) = &args.questions {
        return scanner::load_questions(path);
    }

    args.question
        .as_deref()
        .and_then(|text| manual_question(args.id.as_deref(), text))
        .map(|q| vec![q])
        .ok_or_else(|| FortuneAiError::NoQuestions("質問を入力してください".into()))
}

fn print_usage(usage: &TokenUsage) {
    println!("トークン使用量:");
    println!("  入力: {}", usage.input);
    println!("  出力: {}", usage.output);
    println!("  思考: {}", usage.thinking);
    if usage.cached > 0 {
        println!("  キャッシュ: {}", usage.cached);
    }
    println!("  合計: {}", usage.total());
}
