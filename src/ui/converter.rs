// ============================================================================
// Converter - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, List, etc.)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
//
// Chaque frame est redessinée entièrement depuis App : aucun rendu
// précédent n'est supposé persister.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus, ResultState};
use crate::models::currency_label;

/// Dessine l'interface complète
///
/// # Arguments
/// * `frame` - Surface de dessin ratatui
/// * `app` - État de l'application
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let chunks = create_layout(size);

    render_header(frame, chunks[0]);
    render_amount_input(frame, app, chunks[1]);
    render_selectors(frame, app, chunks[2]);
    render_result(frame, app, chunks[3]);
    render_footer(frame, app, chunks[4]);
}

/// Crée le layout principal (header, montant, sélecteurs, résultat, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : 3 lignes
            Constraint::Length(3), // Saisie du montant : 3 lignes
            Constraint::Min(8),    // Sélecteurs : tout le reste
            Constraint::Length(7), // Panneau de résultat
            Constraint::Length(3), // Footer : 3 lignes
        ])
        .split(area)
        .to_vec() // Convertit Rc<[Rect]> en Vec<Rect>
}

/// Couleur de bordure d'un widget selon son focus
fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Cyan)
    }
}

// ============================================================================
// Header : Titre de l'application
// ============================================================================

/// Dessine le header avec le titre
fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Cambio ")
        .title_alignment(Alignment::Center);

    let text = vec![Line::from(Span::styled(
        "💱 Currency Converter",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ))];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Saisie du montant
// ============================================================================

/// Dessine la ligne de saisie du montant
///
/// Le curseur bloc n'est affiché que quand la saisie a le focus.
fn render_amount_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Amount;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(" Amount ");

    let mut spans = vec![
        Span::styled(
            "Amount: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(&app.amount_input, Style::default().fg(Color::White)),
    ];

    if focused {
        spans.push(Span::styled(
            "█", // Curseur
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    let paragraph = Paragraph::new(vec![Line::from(spans)])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Sélecteurs de devises
// ============================================================================

/// Dessine les deux sélecteurs côte à côte
fn render_selectors(frame: &mut Frame, app: &App, area: Rect) {
    // Découpage horizontal 50/50
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_currency_list(
        frame,
        app,
        halves[0],
        " From Currency ",
        Focus::From,
    );
    render_currency_list(
        frame,
        app,
        halves[1],
        " To Currency ",
        Focus::To,
    );
}

/// Dessine un sélecteur de devises
///
/// CONCEPT RATATUI : Stateful widget
/// - Avec 160 devises, la liste dépasse largement l'écran
/// - ListState + render_stateful_widget : ratatui scrolle pour garder
///   la sélection visible
fn render_currency_list(frame: &mut Frame, app: &App, area: Rect, title: &str, focus: Focus) {
    let list = match focus {
        Focus::From => &app.from_list,
        _ => &app.to_list,
    };
    let focused = app.focus == focus;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(title);

    // Sélecteur vide : en attente du premier chargement
    if list.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Loading...",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
        return;
    }

    // CONCEPT RUST : Iterator chaining
    // - .iter() : itère sur les codes
    // - .map() : transforme chaque code en ListItem labellisé
    // - .collect() : collecte dans un Vec<ListItem>
    let items: Vec<ListItem> = list
        .codes
        .iter()
        .map(|code| ListItem::new(format!(" {}", currency_label(code))))
        .collect();

    let widget = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED), // Inverse les couleurs
    );

    let mut state = ListState::default();
    state.select(Some(list.selected));

    frame.render_stateful_widget(widget, area, &mut state);
}

// ============================================================================
// Panneau de résultat
// ============================================================================

/// Dessine le panneau de résultat selon la state machine
///
/// idle : invite / loading : message / success : montant converti, taux,
/// horodatage / error : message + action [r] quand un retry est offert
fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Result ");

    let text: Vec<Line> = match &app.result {
        ResultState::Idle => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Enter an amount and select currencies to convert",
                Style::default().fg(Color::Gray),
            )),
        ],

        ResultState::Loading { message } => vec![
            Line::from(""),
            Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(Color::Yellow),
            )),
        ],

        ResultState::Success(conversion) => {
            let mut lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    conversion.headline(),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )),
            ];

            if let Some(annotation) = conversion.annotation() {
                lines.push(Line::from(Span::styled(
                    annotation,
                    Style::default().fg(Color::Gray),
                )));
            }

            if let Some(rate_line) = conversion.rate_line() {
                lines.push(Line::from(Span::styled(
                    rate_line,
                    Style::default().fg(Color::Gray),
                )));
            }

            lines.push(Line::from(Span::styled(
                conversion.timestamp_line(),
                Style::default().fg(Color::Gray),
            )));

            lines
        }

        ResultState::Error { message, retry } => {
            let mut lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("⚠ {}", message),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
            ];

            if retry.is_some() {
                lines.push(Line::from(vec![
                    Span::styled(
                        "[r]",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" Retry"),
                ]));
            }

            lines
        }
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : Instructions
// ============================================================================

/// Dessine le footer avec les raccourcis clavier
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        // Message de confirmation de quit
        // CONCEPT : Style avec BLINK pour attirer l'attention
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Quit  "),
            Span::styled("[Tab]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Focus  "),
            Span::styled("[↑↓ / j k]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Navigate  "),
            Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Convert  "),
            Span::styled("[s]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Swap"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
