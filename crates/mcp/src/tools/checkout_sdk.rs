//! Checkout SDK snippet generator. Runs locally; the store API is never called.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tiendanube_client::StoreApi;

use crate::args::{parse, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};

const DOCS_BASE: &str = "https://tiendanube.github.io/api-documentation";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum SdkVersion {
    #[default]
    #[serde(rename = "2025-03")]
    Current,
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "next")]
    Next,
}

impl SdkVersion {
    fn docs_url(self) -> String {
        match self {
            Self::Current => format!("{DOCS_BASE}/resources/checkout_sdk"),
            Self::V1 => format!("{DOCS_BASE}/v1/resources/checkout_sdk"),
            Self::Next => format!("{DOCS_BASE}/next/resources/checkout_sdk"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TipLanguage {
    #[default]
    En,
    Es,
    Pt,
}

impl TipLanguage {
    fn pick(self, en: &'static str, es: &'static str, pt: &'static str) -> &'static str {
        match self {
            Self::En => en,
            Self::Es => es,
            Self::Pt => pt,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SdkFeature {
    InitSkeleton,
    ListenReady,
    PreselectPaymentOption,
    ApplyCouponUi,
    TrackCheckoutEvents,
}

fn default_features() -> Vec<SdkFeature> {
    vec![SdkFeature::InitSkeleton, SdkFeature::ListenReady]
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateTemplateArgs {
    /// Documentation version linked from the template
    #[serde(default)]
    pub version: SdkVersion,
    /// Language for inline tips and instructions
    #[serde(default)]
    pub language: TipLanguage,
    /// Template sections to include
    #[serde(default = "default_features")]
    pub features: Vec<SdkFeature>,
    /// Hint identifying the payment provider or option to preselect
    pub payment_provider_hint: Option<String>,
    /// Notes embedded in the template header
    pub notes: Option<String>,
}

impl Validate for GenerateTemplateArgs {}

/// Renders the HTML/JS skeleton for the requested features.
pub fn render_template(args: &GenerateTemplateArgs) -> String {
    let docs = args.version.docs_url();
    let lang = args.language;
    let mut out: Vec<String> = Vec::new();

    out.push("/*".into());
    out.push("  Tienda Nube / Nuvemshop Checkout SDK starter".into());
    out.push(format!("  Reference: {docs}"));
    if let Some(notes) = args.notes.as_deref().filter(|notes| !notes.is_empty()) {
        out.push(format!("  Notes: {notes}"));
    }
    out.push("  Skeleton only: swap each placeholder for the SDK call documented above.".into());
    out.push("*/".into());

    out.push(String::new());
    out.push("<!-- Load the Checkout SDK; the script URL depends on the docs version -->".into());
    out.push(format!("<!-- Reference: {docs} -->"));
    out.push("<!-- <script src=\"[CHECKOUT_SDK_SCRIPT_URL]\" defer></script> -->".into());

    let has = |feature: SdkFeature| args.features.contains(&feature);

    if has(SdkFeature::InitSkeleton) {
        out.extend(script_block(&[
            "  // Runs once the SDK global is available.",
            "  function onCheckoutSdkReady() {",
            "    // placeholder: grab the checkout instance exposed by the SDK",
            "    // const checkout = window.__NUVEMSHOP_CHECKOUT__ || window.checkout;",
            "  }",
            "  // placeholder: hook the documented readiness event",
            "  // document.addEventListener('checkout:ready', onCheckoutSdkReady);",
        ]));
    }

    if has(SdkFeature::ListenReady) {
        out.extend(script_block(&[
            "  // Readiness listener; rename the event to match the docs.",
            "  // document.addEventListener('checkout:ready', (event) => {",
            "  //   console.log('checkout ready', event.detail);",
            "  // });",
        ]));
    }

    if has(SdkFeature::PreselectPaymentOption) {
        let hint = args.payment_provider_hint.as_deref().unwrap_or("<your provider or option key>");
        let hint_line = format!("  // Provider hint: {hint}");
        out.extend(script_block(&[
            "  // Selects a payment option after the SDK is ready.",
            hint_line.as_str(),
            "  function preselectPaymentOption() {",
            "    // placeholder: call the documented payment selection method",
            "    // checkout.payment.selectOption('your_option_id');",
            "  }",
            "  // document.addEventListener('checkout:ready', preselectPaymentOption);",
        ]));
    }

    if has(SdkFeature::ApplyCouponUi) {
        out.extend(script_block(&[
            "  // Applies a coupon code through the SDK.",
            "  function applyCoupon(code) {",
            "    // placeholder: call the documented coupon method",
            "    // checkout.coupons.apply(code)",
            "    //   .then(() => console.log('coupon applied'))",
            "    //   .catch((error) => console.error('coupon rejected', error));",
            "  }",
        ]));
        out.push(String::new());
        out.push("<!-- Coupon form -->".into());
        out.push("<div style=\"margin: 8px 0;\">".into());
        out.push(format!(
            "  <label>{}: <input id=\"couponCode\" /></label>",
            lang.pick("Coupon", "Cupón", "Cupom")
        ));
        out.push(format!(
            "  <button onclick=\"applyCoupon(document.getElementById('couponCode').value)\">{}</button>",
            lang.pick("Apply", "Aplicar", "Aplicar")
        ));
        out.push("</div>".into());
    }

    if has(SdkFeature::TrackCheckoutEvents) {
        out.extend(script_block(&[
            "  // Lifecycle tracking; event names vary by docs version.",
            "  // document.addEventListener('checkout:payment:selected', (event) => console.log('payment selected', event.detail));",
            "  // document.addEventListener('checkout:submitted', (event) => console.log('checkout submitted', event.detail));",
            "  // document.addEventListener('checkout:completed', (event) => console.log('order completed', event.detail));",
        ]));
    }

    out.join("\n")
}

fn script_block(body: &[&str]) -> Vec<String> {
    let mut block = vec![String::new(), "<script>".to_string()];
    block.extend(body.iter().map(|line| line.to_string()));
    block.push("</script>".to_string());
    block
}

fn instructions(lang: TipLanguage) -> [&'static str; 4] {
    [
        lang.pick(
            "Open the theme file or template that renders the checkout.",
            "Abra el archivo del tema o la plantilla que muestra el checkout.",
            "Abra o arquivo do tema ou o template que exibe o checkout.",
        ),
        lang.pick(
            "Add the Checkout SDK script tag described in the official documentation.",
            "Agregue la etiqueta script del Checkout SDK descrita en la documentación oficial.",
            "Adicione a tag script do Checkout SDK descrita na documentação oficial.",
        ),
        lang.pick(
            "Hook the readiness event and swap each placeholder for the real SDK method.",
            "Conecte el evento de disponibilidad y reemplace cada marcador por el método real del SDK.",
            "Conecte o evento de disponibilidade e troque cada marcador pelo método real do SDK.",
        ),
        lang.pick(
            "Verify the flow end to end on a test store.",
            "Verifique el flujo completo en una tienda de prueba.",
            "Verifique o fluxo completo em uma loja de teste.",
        ),
    ]
}

pub struct CheckoutSdkTools;

#[async_trait]
impl ToolCategory for CheckoutSdkTools {
    fn category_name(&self) -> &'static str {
        "checkout_sdk"
    }

    fn domain(&self) -> Domain {
        Domain::CheckoutSdk
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new::<GenerateTemplateArgs>(
            "tiendanube_generate_checkout_sdk_template",
            "Generate a Checkout SDK integration starter: script tag, code skeleton and setup steps.",
        )]
    }

    async fn call(&self, name: &str, args: Value, _api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_generate_checkout_sdk_template" => {
                let args: GenerateTemplateArgs = parse(args)?;
                Ok(json!({
                    "success": true,
                    "docs": args.version.docs_url(),
                    "template": render_template(&args),
                    "instructions": instructions(args.language),
                }))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
