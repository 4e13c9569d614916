//! Pull-basierter Leser mit `peek(n)`-dann-Rest-Vertrag
//!
//! Liest einen begrenzten Anfang eines Stroms vor, ohne mehr zu verbrauchen
//! als noetig, und setzt danach vorgelesene Bytes und Rest wieder zu einem
//! einzigen Strom zusammen.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Standard-Obergrenze fuer vorgelesene Bytes
pub const PEEK_GRENZE: usize = 64 * 1024;

const LESE_BLOCK: usize = 8 * 1024;

/// Leser mit Vorschau-Puffer
pub struct PeekLeser<R> {
    innen: R,
    puffer: BytesMut,
    grenze: usize,
    ende: bool,
}

impl<R: AsyncRead + Unpin> PeekLeser<R> {
    pub fn neu(innen: R, grenze: usize) -> Self {
        Self {
            innen,
            puffer: BytesMut::new(),
            grenze: grenze.max(1),
            ende: false,
        }
    }

    /// Liest vor bis mindestens `n` Bytes gepuffert sind (oder Stromende)
    ///
    /// `n` wird auf die Grenze gekappt. Kuerzere Ergebnisse bedeuten, dass
    /// der Strom vorher zu Ende war.
    pub async fn peek(&mut self, n: usize) -> std::io::Result<&[u8]> {
        let ziel = n.min(self.grenze);
        let mut block = [0u8; LESE_BLOCK];

        while self.puffer.len() < ziel && !self.ende {
            let max = LESE_BLOCK.min(self.grenze - self.puffer.len());
            let gelesen = self.innen.read(&mut block[..max]).await?;
            if gelesen == 0 {
                self.ende = true;
            } else {
                self.puffer.extend_from_slice(&block[..gelesen]);
            }
        }

        Ok(&self.puffer[..])
    }

    /// Bisher vorgelesene Bytes
    pub fn vorgelesen(&self) -> &[u8] {
        &self.puffer
    }

    /// true wenn das Stromende schon beim Vorlesen erreicht wurde
    pub fn ist_zu_ende(&self) -> bool {
        self.ende
    }

    /// Vorgelesenes + Rest als ein durchgehender Strom
    pub fn in_leser(self) -> impl AsyncRead + Unpin {
        std::io::Cursor::new(self.puffer.freeze()).chain(self.innen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Liefert pro `read` hoechstens `block` Bytes
    struct Tropfen {
        daten: Vec<u8>,
        pos: usize,
        block: usize,
    }

    impl AsyncRead for Tropfen {
        fn poll_read(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            let n = self
                .block
                .min(buf.remaining())
                .min(self.daten.len() - self.pos);
            let start = self.pos;
            buf.put_slice(&self.daten[start..start + n]);
            self.pos += n;
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn peek_liest_nur_bis_ziel() {
        let daten: Vec<u8> = (0..100u8).collect();
        let mut p = PeekLeser::neu(
            Tropfen { daten: daten.clone(), pos: 0, block: 4 },
            PEEK_GRENZE,
        );

        let kopf = p.peek(10).await.unwrap();
        assert!(kopf.len() >= 10);
        // In 4er-Bloecken gelesen: nicht mehr als ein Block zu viel
        assert!(p.vorgelesen().len() < 14);
        assert!(!p.ist_zu_ende());

        let mut alles = Vec::new();
        p.in_leser().read_to_end(&mut alles).await.unwrap();
        assert_eq!(alles, daten);
    }

    #[tokio::test]
    async fn peek_bei_kurzem_strom() {
        let mut p = PeekLeser::neu(&b"ID3"[..], PEEK_GRENZE);
        assert_eq!(p.peek(36).await.unwrap(), b"ID3");
        assert!(p.ist_zu_ende());

        let mut alles = Vec::new();
        p.in_leser().read_to_end(&mut alles).await.unwrap();
        assert_eq!(alles, b"ID3");
    }

    #[tokio::test]
    async fn grenze_wird_eingehalten() {
        let daten = vec![7u8; 1000];
        let mut p = PeekLeser::neu(&daten[..], 16);
        assert_eq!(p.peek(500).await.unwrap().len(), 16);

        let mut alles = Vec::new();
        p.in_leser().read_to_end(&mut alles).await.unwrap();
        assert_eq!(alles.len(), 1000);
    }
}
