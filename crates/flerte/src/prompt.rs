//! Tone personas and prompt construction.
//!
//! Each tone maps to a static [`ToneTemplate`]; prompt text is built from the
//! template alone, so nothing here touches I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FlerteError;

/// Reply used when a completion fails or comes back empty.
pub const FALLBACK_REPLY: &str = "Oi! Como você está?";

/// Number of reply variants produced per generation.
pub const VARIANT_COUNT: usize = 3;

/// Stand-in for an empty received message.
const EMPTY_CONTEXT_PLACEHOLDER: &str = "Oi";

/// Reply style selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Natural,
    Bold,
    Funny,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Natural, Tone::Bold, Tone::Funny];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Natural => "natural",
            Tone::Bold => "bold",
            Tone::Funny => "funny",
        }
    }

    pub fn template(&self) -> &'static ToneTemplate {
        match self {
            Tone::Natural => &NATURAL,
            Tone::Bold => &BOLD,
            Tone::Funny => &FUNNY,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = FlerteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FlerteError::InvalidInput(format!("unknown tone '{s}'")))
    }
}

/// Persona instructions plus few-shot style examples for one tone.
#[derive(Debug)]
pub struct ToneTemplate {
    /// Upper-case label used inside the prompts.
    pub label: &'static str,
    pub instructions: &'static str,
    pub examples: [&'static str; 10],
}

static NATURAL: ToneTemplate = ToneTemplate {
    label: "NORMAL/MADURO",
    instructions: "Seja natural, genuíno, autêntico e maduro. Mostre empatia, sinceridade e \
                   vontade de construir algo real. Use linguagem coloquial mas respeitosa.",
    examples: [
        "Verdade, dei uma sumida mesmo. Que tal a gente recomeçar esse papo direito agora?",
        "Andei na correria, mas você tem razão. Se você ainda topar, quero me fazer mais presente.",
        "Claro que lembro. A gente se marcou de um jeito especial, por isso eu ainda quero falar com você.",
        "Entendo o que você sente. Se fizer sentido pra você, queria conversar com calma pra entender melhor e ver se a gente se alinha.",
        "Eu sou mais observador(a), mas com o tempo vou me soltando. Prometo melhorar essa parte com você.",
        "Fico feliz em ouvir isso, porque eu também senti falta. Nossa conversa faz diferença no meu dia.",
        "Você tem razão. Eu errei em sumir assim. Quero mudar isso e ser mais presente se você ainda tiver paciência comigo.",
        "Ótima pergunta. Que tal escolhermos um dia dessa semana que funcione pros dois?",
        "Você tem razão. A rotina me sugou e não é justo com você. Quero melhorar isso, porque nossa conversa importa pra mim.",
        "Eu também gostei de te conhecer. Ainda tô entendendo o que sinto, mas quero continuar te conhecendo com calma.",
    ],
};

static BOLD: ToneTemplate = ToneTemplate {
    label: "SAFADO/OUSADO",
    instructions: "Seja atrevido, sensual e provocador. Use linguagem coloquial, flerte \
                   descarado, insinuações e confiança. Mostre interesse de forma direta mas charmosa.",
    examples: [
        "Saudade de conversar… e, se eu for sincero(a), saudade de você inteirinho(a) também.",
        "Talvez eu não demonstre tão bem, mas eu tô muito mais afim do que você imagina.",
        "Fofo(a) agora, mas posso ser perigosamente encantador(a) se você deixar.",
        "Tô tentando sim… a pergunta é: tô indo bem ou preciso me esforçar mais?",
        "Então deixa eu subir de nível: que tal a gente marcar algo fora da tela pra equilibrar essas atitudes?",
        "Se depender de mim, a resposta é: o mais rápido possível. Me diz quando você tá livre que eu vou.",
        "Sinto sim. Talvez até mais do que eu demonstro. Se você deixar, quero explorar isso com você.",
        "Falo muito sério. E se depender de mim, esse 'te ver' vira 'te ver mais vezes'.",
        "Saudade de perto eu também sinto… principalmente da sua presença do meu lado.",
        "Tô afim de algo que não seja raso. E, se for com você, melhor ainda.",
    ],
};

static FUNNY: ToneTemplate = ToneTemplate {
    label: "ENGRAÇADO",
    instructions: "Use humor, piadas, memes e referências pop. Seja criativo, leve e divertido. \
                   Faça a pessoa rir com comparações inusitadas e gírias atuais.",
    examples: [
        "Eu sumi, mas voltei mais interessante que nunca 😂 bora colocar o papo em dia?",
        "Meu sinal de Wi-Fi social deu uma bugada, mas já normalizei e tô de volta 😅",
        "Esquecer de você seria bug do sistema, e o meu ainda tá funcionando direitinho 😂",
        "Com todo mundo eu falo, com você eu travo… culpa sua de ser interessante demais 😂",
        "Olha ela mexendo com meu coração de novo 😌 também senti falta do nosso papo.",
        "Eu pareço atualização de app: sumo, mas quando volto trago melhorias 😬",
        "Olha aí a pergunta que eu tava esperando desde 1900 e bolinha 😂",
        "Minha bateria social deu uma descarregada, mas tô plugando de novo agora 😅",
        "Eu gostei tanto que o algoritmo da minha cabeça só recomenda você agora 😳",
        "Às vezes eu entro no modo avião sem avisar, mas já tô ligando o Wi-Fi de novo 😅",
    ],
};

const RULES: &str = "\
REGRAS OBRIGATÓRIAS:
- Mensagens CURTAS (1-2 linhas, máximo 3)
- Use linguagem BRASILEIRA coloquial (tipo \"tô\", \"pra\", \"tá\", \"né\", \"kkk\")
- Seja AUTÊNTICO e humano, nunca pareça robô
- Use emojis COM MODERAÇÃO (1-2 no máximo, ou nenhum)
- Adapte ao contexto da mensagem recebida
- Seja criativo e VARIE as respostas (não repita os exemplos exatamente)
- NUNCA comece com \"Oi\" ou \"Olá\", vá direto ao ponto da resposta
- NUNCA use linguagem formal ou rebuscada
- NUNCA faça mensagens longas ou textões
- NUNCA use chavões de IA tipo \"Como posso ajudar\"
- NUNCA repita os exemplos literalmente

IMPORTANTE: Gere APENAS a mensagem de resposta, sem explicações, sem numeração, \
sem aspas extras. Apenas o texto que a pessoa vai enviar.";

/// System prompt for a tone: persona, numbered examples, then the rules.
pub fn system_prompt(tone: Tone) -> String {
    let template = tone.template();

    let examples = template
        .examples
        .iter()
        .enumerate()
        .map(|(i, example)| format!("{}. \"{}\"", i + 1, example))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Você é um especialista em conversas de flerte e namoro brasileiro. Sua tarefa é gerar \
         APENAS UMA mensagem de resposta que pareça escrita por uma pessoa REAL conversando no \
         WhatsApp/Instagram, NÃO por IA.\n\n\
         TOM {label}: {instructions}\n\n\
         EXEMPLOS DE RESPOSTAS NO TOM {label}:\n\n{examples}\n\n{RULES}",
        label = template.label,
        instructions = template.instructions,
    )
}

/// User turn for one variant. `variant` is 1-based.
pub fn user_prompt(tone: Tone, received: &str, variant: usize) -> String {
    let received = if received.trim().is_empty() {
        EMPTY_CONTEXT_PLACEHOLDER
    } else {
        received
    };

    format!(
        "A mensagem que recebi foi:\n\"{received}\"\n\n\
         Gere UMA resposta no tom {label}.\n\n\
         Lembre-se:\n\
         - Seja CRIATIVO e ÚNICO (não copie os exemplos)\n\
         - Use os exemplos apenas como INSPIRAÇÃO de estilo\n\
         - Seja BRASILEIRO e coloquial\n\
         - Mensagem CURTA (1-2 linhas)\n\
         - Responda APENAS com o texto da mensagem, nada mais\n\n\
         Esta é a versão {variant} de {VARIANT_COUNT}, então seja diferente das outras.",
        label = tone.template().label,
    )
}

const QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’'];

/// Trim a completion and drop one wrapping quote on each side.
///
/// Blank output becomes [`FALLBACK_REPLY`].
pub fn clean_completion(raw: &str) -> String {
    let text = raw.trim();
    let text = text.strip_prefix(QUOTES).unwrap_or(text);
    let text = text.strip_suffix(QUOTES).unwrap_or(text);
    let text = text.trim();

    if text.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        text.to_string()
    }
}
