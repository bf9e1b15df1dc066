// ============================================================================
// Cambio - Convertisseur de devises dans le terminal
// ============================================================================
// Programme TUI : deux sélecteurs de devises, une saisie de montant, et
// l'appel à l'API de taux de change exécuté en arrière-plan
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : tokio::runtime::Runtime dans le worker thread
// 4. RAII : restauration du terminal même en cas d'erreur
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc, Mutex};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use cambio::api::{fetch_conversion_rate, fetch_currency_codes, FetchError};
use cambio::app::{App, Focus, Operation};
use cambio::models::{Conversion, ConversionRequest};
use cambio::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand : Commandes pour le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker thread exécute les appels réseau async
// - Communication via mpsc channels (multi-producer, single-consumer)
//
// Chaque commande porte le numéro de séquence de sa génération : le
// résultat le restitue et l'event loop ignore tout numéro périmé.
// ============================================================================

/// Commandes envoyées au worker thread pour exécuter des appels réseau
#[derive(Debug, Clone)]
enum AppCommand {
    /// Charger la liste des devises (table des taux en base USD)
    LoadCurrencies { seq: u64 },

    /// Exécuter une conversion validée
    Convert { request: ConversionRequest, seq: u64 },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    /// Liste des devises chargée avec succès
    CurrenciesLoaded { seq: u64, codes: Vec<String> },

    /// Échec du chargement de la liste des devises
    CurrenciesFailed { seq: u64, error: FetchError },

    /// Conversion terminée avec succès
    ConversionDone { seq: u64, conversion: Conversion },

    /// Échec d'une conversion (la demande est renvoyée pour le retry)
    ConversionFailed {
        seq: u64,
        request: ConversionRequest,
        error: FetchError,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place
// - Rotation quotidienne automatique des logs
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans :
/// - Linux/WSL : ~/.local/share/cambio/logs/cambio.log
/// - macOS : ~/Library/Application Support/cambio/logs/cambio.log
/// - Windows : C:\Users\<user>\AppData\Local\cambio\logs\cambio.log
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/cambio/logs/cambio.log
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run
/// RUST_LOG=cambio=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("cambio")
        .join("logs");

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : nouveau fichier chaque jour
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "cambio.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: cambio::api::rates)
                .with_thread_ids(true) // Inclut l'ID du thread (utile pour le worker)
                .with_line_number(true), // Inclut le numéro de ligne
        )
        .with(
            // Filtre les logs par niveau
            // RUST_LOG=debug : tous les logs debug+
            // Par défaut : debug pour cambio, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cambio=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging FIRST
    // - Si init échoue, on affiche l'erreur et continue quand même
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("Cambio starting up");

    // Setup du terminal en mode TUI
    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    // Crée l'état de l'application
    // CONCEPT RUST : Arc<Mutex<>> pour partage entre threads
    // - Arc : Reference counting pour ownership partagé
    // - Mutex : Protection contre les data races
    let app = Arc::new(Mutex::new(App::new()));

    // Crée les channels pour communication avec le worker
    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    // Lance le worker thread en arrière-plan
    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx);

    // Chargement initial de la liste des devises, via le worker :
    // l'indicateur de chargement est visible dès la première frame
    {
        let mut app_lock = app.lock().unwrap();
        issue_operation(&mut app_lock, Operation::LoadCurrencies, &command_tx);
    }

    // Crée le gestionnaire d'événements
    let events = EventHandler::new();

    // Exécute l'event loop
    info!("Starting event loop");
    let result = run(&mut terminal, app.clone(), &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Background async worker avec channels
// - Thread séparé qui traite les commandes async
// - Reçoit des AppCommand via un channel (command_rx)
// - Envoie des AppResult via un autre channel (result_tx)
// - Permet de faire des appels réseau sans bloquer l'UI
//
// Le worker ne touche jamais à App : tout repasse par le channel de
// résultats, appliqué sur le thread de l'event loop.
// ============================================================================

/// Worker thread qui exécute les appels réseau en arrière-plan
///
/// # Arguments
/// * `command_rx` - Receiver pour recevoir les commandes
/// * `result_tx` - Sender pour envoyer les résultats
fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        // Crée un runtime tokio pour ce thread
        // CONCEPT : Runtime per-thread
        // - block_on() bloque le thread worker (pas l'UI)
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

        loop {
            match command_rx.recv() {
                Ok(command) => {
                    info!(?command, "Worker received command");

                    match command {
                        AppCommand::LoadCurrencies { seq } => {
                            let result = runtime.block_on(fetch_currency_codes());

                            match result {
                                Ok(codes) => {
                                    info!(seq, codes = codes.len(), "Currency list loaded");
                                    let _ = result_tx
                                        .send(AppResult::CurrenciesLoaded { seq, codes });
                                }
                                Err(error) => {
                                    error!(seq, error = %error, "Failed to load currency list");
                                    let _ = result_tx
                                        .send(AppResult::CurrenciesFailed { seq, error });
                                }
                            }
                        }

                        AppCommand::Convert { request, seq } => {
                            let result = runtime
                                .block_on(fetch_conversion_rate(&request.from, &request.to));

                            match result {
                                Ok(rate) => {
                                    info!(seq, rate, from = %request.from, to = %request.to, "Conversion rate fetched");
                                    let conversion = Conversion::with_rate(request, rate);
                                    let _ = result_tx
                                        .send(AppResult::ConversionDone { seq, conversion });
                                }
                                Err(error) => {
                                    error!(seq, error = %error, "Failed to fetch conversion rate");
                                    let _ = result_tx.send(AppResult::ConversionFailed {
                                        seq,
                                        request,
                                        error,
                                    });
                                }
                            }
                        }
                    }
                }
                Err(_) => {
                    // Channel fermé, on quitte
                    info!("Worker thread exiting (channel closed)");
                    break;
                }
            }
        }
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Event Loop Pattern
// - Loop infinie : while app.is_running()
// - À chaque itération :
//   0. Appliquer les résultats du worker
//   1. Dessiner l'interface (render)
//   2. Traiter les événements (input)
//   3. Mettre à jour l'état (update)
// ============================================================================

/// Exécute la boucle principale de l'application
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    loop {
        // Vérifie si l'app est toujours en cours d'exécution
        // CONCEPT : Lock scope minimisé
        {
            let app_lock = app.lock().unwrap();
            if !app_lock.is_running() {
                break;
            }
        }

        // ========================================
        // 0. RÉSULTATS : Traite les résultats du worker
        // ========================================
        // CONCEPT : Non-blocking receive avec try_recv
        match result_rx.try_recv() {
            Ok(result) => {
                let mut app_lock = app.lock().unwrap();
                apply_result(&mut app_lock, result);
            }
            Err(mpsc::TryRecvError::Empty) => {
                // Pas de résultat, c'est normal
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("Worker thread disconnected!");
                // Continue quand même, mais le worker est mort
            }
        }

        // ========================================
        // 1. RENDER : Dessine l'interface
        // ========================================
        {
            let app_clone = app.clone();
            terminal.draw(|frame| {
                let app_lock = app_clone.lock().unwrap();
                render(frame, &app_lock);
            })?;
        }

        // ========================================
        // 2. INPUT : Traite les événements
        // ========================================
        match events.next() {
            Ok(event) => {
                let mut app_lock = app.lock().unwrap();
                handle_event(&mut app_lock, event, &command_tx);
            }
            Err(_) => {
                // Erreur lors de la lecture d'événement
            }
        }

        // ========================================
        // 3. UPDATE : Met à jour l'état
        // ========================================
        {
            let mut app_lock = app.lock().unwrap();
            app_lock.tick();
        }
    }

    Ok(())
}

// ============================================================================
// Application des résultats du worker
// ============================================================================

/// Applique un résultat du worker à l'état de l'application
///
/// CONCEPT : Last request wins
/// - Chaque résultat présente son numéro de séquence
/// - Un numéro périmé (demande remplacée entre-temps) est ignoré :
///   il n'écrase jamais un résultat plus récent
fn apply_result(app: &mut App, result: AppResult) {
    match result {
        AppResult::CurrenciesLoaded { seq, codes } => {
            if !app.is_current(seq) {
                debug!(seq, "Dropping stale currency list result");
                return;
            }
            info!(seq, codes = codes.len(), "Populating currency selectors");
            app.set_currencies(codes);
        }

        AppResult::CurrenciesFailed { seq, error } => {
            if !app.is_current(seq) {
                debug!(seq, "Dropping stale currency list failure");
                return;
            }
            error!(seq, error = %error, "Currency list load failed, applying fallback");
            app.set_load_error(&error);
            // Remplacement inconditionnel : les sélecteurs restent
            // utilisables même sans accès au service distant
            app.apply_fallback_currencies();
        }

        AppResult::ConversionDone { seq, conversion } => {
            if !app.is_current(seq) {
                debug!(seq, "Dropping stale conversion result");
                return;
            }
            info!(seq, headline = %conversion.headline(), "Conversion rendered");
            app.set_success(conversion);
        }

        AppResult::ConversionFailed { seq, request, error } => {
            if !app.is_current(seq) {
                debug!(seq, "Dropping stale conversion failure");
                return;
            }
            error!(seq, error = %error, "Conversion failed");
            app.set_conversion_error(request, &error);
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================
// CONCEPT : Event Handler Pattern
// - Sépare la logique de gestion des événements
// - Modifie l'état de app selon l'événement
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching complexe avec guards
/// - Guard clauses (if) pour filtrer les événements
/// - La saisie du montant ne capture que chiffres et point : les lettres
///   restent disponibles pour les raccourcis
fn handle_event(app: &mut App, event: cambio::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use cambio::ui::events::{
        get_char_from_event, is_amount_char_event, is_back_tab_event, is_backspace_event,
        is_down_event, is_enter_event, is_quit_event, is_retry_event, is_swap_event,
        is_tab_event, is_up_event, Event,
    };

    match event {
        Event::Key(_) if is_quit_event(&event) => {
            // Touche 'q' : quit confirmation two-step
            // - Première pression : active confirm_quit
            // - Deuxième pression : quit réel
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // Tab / Shift+Tab : cycle du focus Montant -> Source -> Cible
        Event::Key(_) if is_tab_event(&event) => {
            app.cancel_quit();
            app.focus_next();
            debug!(focus = ?app.focus, "Focus moved");
        }
        Event::Key(_) if is_back_tab_event(&event) => {
            app.cancel_quit();
            app.focus_previous();
            debug!(focus = ?app.focus, "Focus moved");
        }

        // Navigation dans le sélecteur qui a le focus
        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.navigate_down();
        }

        // Enter : soumettre la conversion
        Event::Key(_) if is_enter_event(&event) => {
            app.cancel_quit();
            submit_conversion(app, command_tx);
        }

        // 's' : échanger source et cible
        Event::Key(_) if is_swap_event(&event) => {
            app.cancel_quit();
            app.swap_currencies();
            info!(
                from = %app.from_list.selected_code(),
                to = %app.to_list.selected_code(),
                "Currencies swapped"
            );

            // Relance la conversion si un montant convertible est déjà saisi
            if app.has_convertible_amount() {
                submit_conversion(app, command_tx);
            }
        }

        // 'r' : relancer l'opération échouée avec les mêmes entrées
        Event::Key(_) if is_retry_event(&event) => {
            app.cancel_quit();
            if let Some(operation) = app.retry_operation() {
                info!(?operation, "User requested retry");
                issue_operation(app, operation, command_tx);
            }
        }

        // Saisie du montant (seulement quand la saisie a le focus)
        Event::Key(_) if is_backspace_event(&event) && app.focus == Focus::Amount => {
            app.backspace();
        }
        Event::Key(_) if is_amount_char_event(&event) && app.focus == Focus::Amount => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }

        Event::Tick => {
            // Tick régulier : rien à faire pour l'instant
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation si active
            app.cancel_quit();
        }

        _ => {
            // Autres événements : ignorés
        }
    }
}

/// Valide la saisie et lance la conversion
///
/// Les contrôles de saisie court-circuitent sans appel réseau, la
/// conversion même devise aussi (résultat trivial immédiat).
fn submit_conversion(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    match app.build_request() {
        Err(error) => {
            warn!(error = %error, "Rejected conversion input");
            app.set_validation_error(&error);
        }

        Ok(request) if request.same_currency() => {
            info!(code = %request.from, "Same-currency conversion, no network call");
            app.set_success(Conversion::identity(request));
        }

        Ok(request) => {
            issue_operation(app, Operation::Convert(request), command_tx);
        }
    }
}

/// Émet une opération réseau : nouvelle génération + commande au worker
fn issue_operation(app: &mut App, operation: Operation, command_tx: &mpsc::Sender<AppCommand>) {
    match operation {
        Operation::LoadCurrencies => {
            let seq = app.begin_operation("Loading currencies...".to_string());
            debug!(seq, "Issuing currency list load");
            let _ = command_tx.send(AppCommand::LoadCurrencies { seq });
        }
        Operation::Convert(request) => {
            let seq = app.begin_operation("Converting...".to_string());
            debug!(seq, from = %request.from, to = %request.to, "Issuing conversion");
            let _ = command_tx.send(AppCommand::Convert { request, seq });
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// CONCEPT RUST : Terminal raw mode
// - Raw mode : on reçoit tous les caractères directement
// - Alternate screen : écran secondaire (ne pollue pas l'historique)
//
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    // Active le raw mode
    enable_raw_mode()?;

    // Écran secondaire qui ne pollue pas l'historique
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture // Active la souris (optionnel)
    )?;

    // Crée le backend crossterm
    let backend = CrosstermBackend::new(stdout);

    // Crée le terminal ratatui
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
///
/// Appelé dans main() même en cas d'erreur, pour ne pas laisser le
/// terminal cassé.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}
